//! Deadline-bounded execution of blocking provider calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::warn;

use crate::error::ProviderError;
use crate::models::document::{DocumentType, ProviderResult};
use crate::provider::Provider;

/// Run a blocking closure on the worker pool, giving up after `deadline`.
///
/// On timeout the worker is abandoned: it keeps running to completion but
/// its result is dropped. A panic in `f` is reported as a backend failure.
pub async fn run_with_deadline<T, F>(
    label: &str,
    deadline: Duration,
    f: F,
) -> Result<T, ProviderError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProviderError> + Send + 'static,
{
    match timeout(deadline, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(ProviderError::Backend(format!("{} worker failed: {}", label, join))),
        Err(_) => Err(ProviderError::Timeout {
            provider: label.to_string(),
            after: deadline,
        }),
    }
}

/// Runs provider calls under the per-provider deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutExecutor {
    deadline: Duration,
}

impl TimeoutExecutor {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Call `provider`, folding every error into a failed result.
    pub async fn call(
        &self,
        provider: Arc<dyn Provider>,
        image: Arc<[u8]>,
        document_type: DocumentType,
    ) -> ProviderResult {
        let name = provider.name().to_string();
        let outcome = run_with_deadline(&name, self.deadline, move || {
            provider.process_document(&image, document_type)
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!("Provider {} failed: {}", name, e);
                ProviderResult::failure(e.to_string())
            }
        }
    }
}

/// Trigger side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed side of a cancellation signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create a linked handle and signal.
    pub fn pair() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_handle, signal) = Self::pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested; pend forever otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::provider::BackendKind;

    struct Sleepy(Duration);

    impl Provider for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Local
        }

        fn process_document(
            &self,
            _image: &[u8],
            _document_type: DocumentType,
        ) -> Result<ProviderResult, ProviderError> {
            std::thread::sleep(self.0);
            Ok(ProviderResult::success(Default::default(), "late"))
        }
    }

    struct Failing;

    impl Provider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Cloud
        }

        fn process_document(
            &self,
            _image: &[u8],
            _document_type: DocumentType,
        ) -> Result<ProviderResult, ProviderError> {
            Err(ProviderError::Backend("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_deadline_abandons_slow_call() {
        let executor = TimeoutExecutor::new(Duration::from_millis(50));
        let start = Instant::now();
        let result = executor
            .call(Arc::new(Sleepy(Duration::from_secs(1))), Arc::from(&b""[..]), DocumentType::Resume)
            .await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or("").contains("timed out"));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_error_becomes_failed_result() {
        let executor = TimeoutExecutor::new(Duration::from_secs(1));
        let result = executor
            .call(Arc::new(Failing), Arc::from(&b""[..]), DocumentType::Resume)
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("backend failure: quota exceeded"));
    }

    #[tokio::test]
    async fn test_panic_is_backend_failure() {
        let outcome: Result<(), ProviderError> =
            run_with_deadline("boom", Duration::from_secs(1), || panic!("boom")).await;
        assert!(matches!(outcome, Err(ProviderError::Backend(_))));
    }

    #[tokio::test]
    async fn test_fast_call_succeeds() {
        let outcome = run_with_deadline("fast", Duration::from_secs(1), || Ok(7)).await;
        assert_eq!(outcome, Ok(7));
    }

    #[tokio::test]
    async fn test_cancel_signal() {
        let (handle, signal) = CancelSignal::pair();
        assert!(!signal.is_cancelled());
        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.cancelled().await }
        });
        handle.cancel();
        waiter.await.unwrap();
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_never_does_not_fire() {
        let signal = CancelSignal::never();
        let fired = timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(fired.is_err());
    }
}
