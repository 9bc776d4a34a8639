//! Core library for Japanese identity and attendance document OCR.
//!
//! This crate provides:
//! - Recognition providers (cloud, ONNX, Tesseract) behind one capability
//! - Deadline-bounded provider execution with cancellation
//! - Provider orchestration with complement, merge and fallback strategies
//! - Field extraction for residence cards, resumes and driver's licenses
//! - Timer card (attendance sheet) parsing and roster matching

pub mod error;
pub mod executor;
pub mod fields;
pub mod identity;
pub mod merge;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod pdf;
pub mod provider;
pub mod timecard;

pub use error::{ExtractionError, KirokuError, ProviderError, Result};
pub use executor::{CancelHandle, CancelSignal, TimeoutExecutor};
pub use identity::{IdentityResolver, InMemoryRoster, Roster, RosterEntry};
pub use merge::merge;
pub use metrics::{MetricsSink, ProviderAttempt, RecordingSink, TracingSink};
pub use models::attendance::{AttendanceReport, DailyRecord, EmployeeMatch, PageError};
pub use models::config::KirokuConfig;
pub use models::document::{
    DocumentType, ExtractionMethod, ExtractionResult, ProviderResult, Strategy,
};
pub use orchestrator::Orchestrator;
pub use provider::{AvailableProviders, BackendKind, Provider, ProviderSlot};
pub use timecard::{TimecardExtractor, TimecardSheet};
