//! Data models and configuration.

pub mod attendance;
pub mod config;
pub mod document;
