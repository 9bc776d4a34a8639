//! Per-attempt observability events.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::models::document::DocumentType;

/// One provider attempt, emitted whether it succeeded or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAttempt {
    pub operation: &'static str,
    pub document_type: DocumentType,
    pub method: &'static str,
    pub duration_seconds: f64,
    pub success: bool,
}

impl ProviderAttempt {
    pub fn new(
        operation: &'static str,
        document_type: DocumentType,
        method: &'static str,
        duration: Duration,
        success: bool,
    ) -> Self {
        Self {
            operation,
            document_type,
            method,
            duration_seconds: duration.as_secs_f64(),
            success,
        }
    }
}

/// Receiver of attempt events. Must not block.
pub trait MetricsSink: Send + Sync {
    fn record(&self, attempt: ProviderAttempt);
}

/// Logs every attempt under the `kiroku::metrics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&self, attempt: ProviderAttempt) {
        info!(
            target: "kiroku::metrics",
            operation = attempt.operation,
            document_type = %attempt.document_type,
            method = attempt.method,
            duration_seconds = attempt.duration_seconds,
            success = attempt.success,
            "provider attempt"
        );
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    attempts: Mutex<Vec<ProviderAttempt>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> Vec<ProviderAttempt> {
        self.attempts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.attempts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricsSink for RecordingSink {
    fn record(&self, attempt: ProviderAttempt) {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(attempt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        assert!(sink.is_empty());
        sink.record(ProviderAttempt::new(
            "process_document",
            DocumentType::Resume,
            "provider_a",
            Duration::from_millis(1500),
            true,
        ));
        let attempts = sink.attempts();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].duration_seconds, 1.5);
        assert_eq!(attempts[0].method, "provider_a");
    }

    #[test]
    fn test_attempt_serializes() {
        let attempt = ProviderAttempt::new(
            "process_document",
            DocumentType::TimerCard,
            "provider_c",
            Duration::ZERO,
            false,
        );
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["document_type"], "timer_card");
        assert_eq!(json["success"], false);
    }
}
