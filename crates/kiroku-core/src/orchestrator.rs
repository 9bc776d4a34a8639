//! Provider selection, fallback and merging for one document.
//!
//! Flow per request: check the image, try the primary provider (or A and B
//! together in auto mode), complement or merge, fall back to provider C, and
//! give up with a structured failure. The whole flow runs under the overall
//! deadline and stops as soon as the caller cancels.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, KirokuError, PdfError, ProviderError, Result};
use crate::executor::{CancelSignal, TimeoutExecutor};
use crate::identity::IdentityResolver;
use crate::merge::{merge, MERGED_CONFIDENCE};
use crate::metrics::{MetricsSink, ProviderAttempt, TracingSink};
use crate::models::attendance::{AttendanceReport, DailyRecord, PageError};
use crate::models::config::{KirokuConfig, OrchestratorConfig, PdfConfig};
use crate::models::document::{
    DocumentType, ExtractionMethod, ExtractionResult, ProviderResult, Strategy,
};
use crate::pdf::{PdfExtractor, PdfPage};
use crate::provider::{AvailableProviders, BackendKind, ProviderSlot};
use crate::timecard::{TimecardExtractor, UNKNOWN_NAME};

const OPERATION: &str = "process_document";

/// Drives providers for one document at a time. Cheap to share behind an `Arc`.
pub struct Orchestrator {
    providers: AvailableProviders,
    config: OrchestratorConfig,
    pdf: PdfConfig,
    executor: TimeoutExecutor,
    metrics: Arc<dyn MetricsSink>,
    identity: Option<IdentityResolver>,
    timecard: TimecardExtractor,
}

impl Orchestrator {
    pub fn new(providers: AvailableProviders, config: OrchestratorConfig) -> Self {
        Self {
            providers,
            executor: TimeoutExecutor::new(config.provider_timeout()),
            config,
            pdf: PdfConfig::default(),
            metrics: Arc::new(TracingSink),
            identity: None,
            timecard: TimecardExtractor::new(),
        }
    }

    /// Build providers and settings from a full configuration.
    pub fn from_config(config: &KirokuConfig) -> Self {
        Self::new(
            AvailableProviders::from_config(&config.providers),
            config.orchestrator.clone(),
        )
        .with_pdf_config(config.pdf.clone())
    }

    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = sink;
        self
    }

    pub fn with_identity(mut self, resolver: IdentityResolver) -> Self {
        self.identity = Some(resolver);
        self
    }

    pub fn with_timecard(mut self, extractor: TimecardExtractor) -> Self {
        self.timecard = extractor;
        self
    }

    pub fn with_pdf_config(mut self, pdf: PdfConfig) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn providers(&self) -> &AvailableProviders {
        &self.providers
    }

    /// Recognize one document image.
    pub async fn process_document(
        &self,
        image: &[u8],
        document_type: DocumentType,
        strategy: Strategy,
    ) -> ExtractionResult {
        self.process_document_with_cancel(image, document_type, strategy, &CancelSignal::never())
            .await
    }

    /// Recognize one document image, stopping early if `cancel` fires.
    ///
    /// Never fails: every outcome is an [`ExtractionResult`], with `failure`
    /// set when `success` is false.
    pub async fn process_document_with_cancel(
        &self,
        image: &[u8],
        document_type: DocumentType,
        strategy: Strategy,
        cancel: &CancelSignal,
    ) -> ExtractionResult {
        let start = Instant::now();

        if let Err(reason) = check_image(image) {
            warn!("Rejected {} image: {}", document_type, reason);
            return ExtractionResult::failed(
                ExtractionMethod::None,
                ExtractionError::MalformedDocument(reason),
            );
        }

        let image: Arc<[u8]> = Arc::from(image);
        let deadline = self.config.overall_timeout();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Processing of {} cancelled", document_type);
                ExtractionResult::failed(ExtractionMethod::Timeout, ExtractionError::Cancelled)
            }
            outcome = timeout(deadline, self.run_strategy(&image, document_type, strategy)) => {
                outcome.unwrap_or_else(|_| {
                    warn!("Processing of {} exceeded {:?}", document_type, deadline);
                    ExtractionResult::failed(ExtractionMethod::Timeout, ExtractionError::Timeout)
                })
            }
        };

        info!(
            "{} via {} ({:?}): success={} confidence={:.2} in {:.2}s",
            document_type,
            result.method_used.as_str(),
            strategy,
            result.success,
            result.confidence,
            start.elapsed().as_secs_f64()
        );
        result
    }

    async fn run_strategy(
        &self,
        image: &Arc<[u8]>,
        document_type: DocumentType,
        strategy: Strategy,
    ) -> ExtractionResult {
        match strategy {
            Strategy::PreferA => {
                self.sequential(ProviderSlot::A, ProviderSlot::B, image, document_type)
                    .await
            }
            Strategy::PreferB => {
                self.sequential(ProviderSlot::B, ProviderSlot::A, image, document_type)
                    .await
            }
            Strategy::Auto => self.concurrent(image, document_type).await,
        }
    }

    /// Primary first; the other provider only complements a failed or
    /// incomplete primary result.
    async fn sequential(
        &self,
        primary_slot: ProviderSlot,
        secondary_slot: ProviderSlot,
        image: &Arc<[u8]>,
        document_type: DocumentType,
    ) -> ExtractionResult {
        let levels = self.config.confidence;
        let primary = self.attempt(primary_slot, image, document_type).await;

        if primary.success {
            if !primary.is_incomplete(document_type, self.config.incomplete_ratio) {
                return self.single(&primary, primary_slot, levels.primary);
            }
            debug!(
                "{} result incomplete: {}/{} critical fields missing",
                primary_slot,
                primary.missing_critical(document_type),
                document_type.critical_fields().len()
            );
        }

        let secondary = self.attempt(secondary_slot, image, document_type).await;

        match (primary.success, secondary.success) {
            (true, true) => {
                let mut merged = merge(&primary, &secondary, self.backend_kind(primary_slot));
                merged.confidence = capped(levels.complemented);
                merged
            }
            (true, false) => self.single(&primary, primary_slot, levels.degraded_primary),
            (false, true) => self.single(&secondary, secondary_slot, levels.degraded_primary),
            (false, false) => self.last_resort(image, document_type).await,
        }
    }

    /// A and B at the same time; A is always the merge primary.
    async fn concurrent(&self, image: &Arc<[u8]>, document_type: DocumentType) -> ExtractionResult {
        let levels = self.config.confidence;
        let (a, b) = tokio::join!(
            self.attempt(ProviderSlot::A, image, document_type),
            self.attempt(ProviderSlot::B, image, document_type),
        );

        match (a.success, b.success) {
            (true, true) => {
                let mut merged = merge(&a, &b, self.backend_kind(ProviderSlot::A));
                merged.confidence = capped(levels.hybrid);
                merged
            }
            (true, false) => self.single(&a, ProviderSlot::A, levels.primary),
            (false, true) => self.single(&b, ProviderSlot::B, levels.primary),
            (false, false) => self.last_resort(image, document_type).await,
        }
    }

    async fn last_resort(&self, image: &Arc<[u8]>, document_type: DocumentType) -> ExtractionResult {
        let result = self.attempt(ProviderSlot::C, image, document_type).await;
        if result.success {
            self.single(&result, ProviderSlot::C, self.config.confidence.fallback)
        } else {
            ExtractionResult::failed(ExtractionMethod::None, ExtractionError::NoProviderSucceeded)
        }
    }

    /// One provider call under the per-provider deadline, with its metrics event.
    async fn attempt(
        &self,
        slot: ProviderSlot,
        image: &Arc<[u8]>,
        document_type: DocumentType,
    ) -> ProviderResult {
        let Some(provider) = self.providers.get(slot) else {
            debug!("{} not configured", slot);
            return ProviderResult::failure(ProviderError::Unavailable(slot.to_string()).to_string());
        };

        let start = Instant::now();
        let result = self
            .executor
            .call(Arc::clone(provider), Arc::clone(image), document_type)
            .await;

        self.metrics.record(ProviderAttempt::new(
            OPERATION,
            document_type,
            slot.method().as_str(),
            start.elapsed(),
            result.success,
        ));
        result
    }

    fn single(&self, result: &ProviderResult, slot: ProviderSlot, confidence: f32) -> ExtractionResult {
        ExtractionResult::from_provider(result, slot.method(), capped(confidence))
    }

    fn backend_kind(&self, slot: ProviderSlot) -> BackendKind {
        self.providers
            .get(slot)
            .map_or(BackendKind::Local, |p| p.kind())
    }

    /// Read every page of an attendance PDF.
    pub async fn extract_attendance(
        &self,
        pdf: &[u8],
        org_unit: Option<&str>,
    ) -> Result<AttendanceReport> {
        self.extract_attendance_with_cancel(pdf, org_unit, &CancelSignal::never())
            .await
    }

    /// Read every page of an attendance PDF, stopping if `cancel` fires.
    ///
    /// Fails only when the PDF itself cannot be opened or the caller
    /// cancels; page failures are collected in the report.
    pub async fn extract_attendance_with_cancel(
        &self,
        pdf: &[u8],
        org_unit: Option<&str>,
        cancel: &CancelSignal,
    ) -> Result<AttendanceReport> {
        let data = pdf.to_vec();
        let max_pages = self.pdf.max_pages;

        let pages = tokio::task::spawn_blocking(move || {
            PdfExtractor::load(&data).map(|doc| doc.pages(max_pages))
        })
        .await
        .map_err(|e| KirokuError::Pdf(PdfError::Parse(format!("PDF worker failed: {}", e))))??;

        self.extract_attendance_pages(pages, org_unit, cancel).await
    }

    /// Read already-loaded pages. Each page is handled independently.
    pub async fn extract_attendance_pages(
        &self,
        pages: Vec<PdfPage>,
        org_unit: Option<&str>,
        cancel: &CancelSignal,
    ) -> Result<AttendanceReport> {
        let mut report = AttendanceReport::default();

        for page in &pages {
            if cancel.is_cancelled() {
                return Err(ExtractionError::Cancelled.into());
            }
            report.pages_processed += 1;

            match self.read_page(page, org_unit, cancel).await {
                Ok(records) => {
                    debug!("Page {}: {} records", page.number, records.len());
                    report.records.extend(records);
                }
                Err(ExtractionError::Cancelled) => return Err(ExtractionError::Cancelled.into()),
                Err(e) => {
                    warn!("Page {} failed: {}", page.number, e);
                    report.processing_errors.push(PageError {
                        page: page.number,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Attendance: {} pages, {} records, {} page errors",
            report.pages_processed,
            report.records.len(),
            report.processing_errors.len()
        );
        Ok(report)
    }

    async fn read_page(
        &self,
        page: &PdfPage,
        org_unit: Option<&str>,
        cancel: &CancelSignal,
    ) -> std::result::Result<Vec<DailyRecord>, ExtractionError> {
        let text = if self.pdf.prefer_embedded_text && page.has_text_layer(self.pdf.min_text_length) {
            debug!("Page {} uses its embedded text", page.number);
            page.text.clone()
        } else {
            let image = page.image.as_deref().ok_or_else(|| {
                ExtractionError::MalformedDocument("page has neither text nor a scan image".to_string())
            })?;
            let result = self
                .process_document_with_cancel(
                    image,
                    DocumentType::TimerCard,
                    self.config.default_strategy,
                    cancel,
                )
                .await;
            if !result.success {
                return Err(result.failure.unwrap_or(ExtractionError::NoProviderSucceeded));
            }
            result.raw_text
        };

        let sheet = self.timecard.extract(&text)?;

        let employee_match = match &self.identity {
            Some(resolver) if sheet.employee_name != UNKNOWN_NAME => {
                Some(resolver.match_name(&sheet.employee_name, org_unit))
            }
            _ => None,
        };

        Ok(sheet
            .records
            .into_iter()
            .map(|record| DailyRecord {
                employee_match: employee_match.clone(),
                ..record
            })
            .collect())
    }
}

fn capped(confidence: f32) -> f32 {
    confidence.clamp(0.0, MERGED_CONFIDENCE)
}

/// Decode just enough of the image to know it is one.
fn check_image(bytes: &[u8]) -> std::result::Result<(u32, u32), String> {
    if bytes.is_empty() {
        return Err("empty image".to_string());
    }
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .into_dimensions()
        .map_err(|e| format!("undecodable image: {}", e))
}
