//! Recognition backends behind a uniform capability.
//!
//! Every backend turns image bytes into raw text; the shared field rules in
//! [`crate::fields`] then build the per-document field map. Calls are
//! blocking and run on the executor's worker pool.

#[cfg(feature = "cloud")]
mod cloud;
#[cfg(feature = "native")]
mod onnx;
mod tesseract;

#[cfg(feature = "cloud")]
pub use cloud::CloudProvider;
#[cfg(feature = "native")]
pub use onnx::OnnxProvider;
pub use tesseract::TesseractProvider;

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ProviderError;
use crate::fields::extract_fields;
use crate::models::config::ProvidersConfig;
use crate::models::document::{DocumentType, ExtractionMethod, ProviderResult};

/// Where a backend runs. The merge rules treat cloud output differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Cloud,
    Local,
}

/// A document recognition backend.
pub trait Provider: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Recognize one document image.
    fn process_document(
        &self,
        image: &[u8],
        document_type: DocumentType,
    ) -> Result<ProviderResult, ProviderError>;
}

/// Build a successful result from recognized text.
pub fn recognized(document_type: DocumentType, text: &str) -> ProviderResult {
    ProviderResult::success(extract_fields(document_type, text), text)
}

/// Position of a provider in the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderSlot {
    A,
    B,
    C,
}

impl ProviderSlot {
    pub fn method(&self) -> ExtractionMethod {
        match self {
            Self::A => ExtractionMethod::ProviderA,
            Self::B => ExtractionMethod::ProviderB,
            Self::C => ExtractionMethod::ProviderC,
        }
    }
}

impl fmt::Display for ProviderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// The providers configured for this process, assembled once at startup.
///
/// An empty slot is simply unavailable; the orchestrator skips it.
#[derive(Clone, Default)]
pub struct AvailableProviders {
    pub a: Option<Arc<dyn Provider>>,
    pub b: Option<Arc<dyn Provider>>,
    pub c: Option<Arc<dyn Provider>>,
}

impl AvailableProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: ProviderSlot, provider: impl Provider + 'static) -> Self {
        let provider: Arc<dyn Provider> = Arc::new(provider);
        match slot {
            ProviderSlot::A => self.a = Some(provider),
            ProviderSlot::B => self.b = Some(provider),
            ProviderSlot::C => self.c = Some(provider),
        }
        self
    }

    pub fn get(&self, slot: ProviderSlot) -> Option<&Arc<dyn Provider>> {
        match slot {
            ProviderSlot::A => self.a.as_ref(),
            ProviderSlot::B => self.b.as_ref(),
            ProviderSlot::C => self.c.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_none() && self.b.is_none() && self.c.is_none()
    }

    /// Assemble providers from configuration.
    ///
    /// Slot A is the cloud backend, B the ONNX engine and C Tesseract. A
    /// backend that is disabled, compiled out, or fails to initialise leaves
    /// its slot empty.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let mut providers = Self::new();

        #[cfg(feature = "cloud")]
        if config.cloud.enabled {
            match CloudProvider::new(config.cloud.clone()) {
                Ok(p) => providers = providers.with(ProviderSlot::A, p),
                Err(e) => warn!("Cloud provider disabled: {}", e),
            }
        }

        #[cfg(feature = "native")]
        if config.onnx.enabled {
            match OnnxProvider::from_config(&config.onnx) {
                Ok(p) => providers = providers.with(ProviderSlot::B, p),
                Err(e) => warn!("ONNX provider disabled: {}", e),
            }
        }

        if config.tesseract.enabled {
            providers = providers.with(ProviderSlot::C, TesseractProvider::new(config.tesseract.clone()));
        }

        info!(
            "Providers: A={} B={} C={}",
            slot_name(&providers.a),
            slot_name(&providers.b),
            slot_name(&providers.c)
        );
        providers
    }
}

impl fmt::Debug for AvailableProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailableProviders")
            .field("a", &slot_name(&self.a))
            .field("b", &slot_name(&self.b))
            .field("c", &slot_name(&self.c))
            .finish()
    }
}

fn slot_name(slot: &Option<Arc<dyn Provider>>) -> &str {
    slot.as_deref().map_or("-", |p| p.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Provider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Local
        }

        fn process_document(
            &self,
            image: &[u8],
            document_type: DocumentType,
        ) -> Result<ProviderResult, ProviderError> {
            Ok(recognized(document_type, &String::from_utf8_lossy(image)))
        }
    }

    #[test]
    fn test_slots() {
        let providers = AvailableProviders::new().with(ProviderSlot::B, Echo);
        assert!(providers.get(ProviderSlot::A).is_none());
        assert_eq!(providers.get(ProviderSlot::B).map(|p| p.name()), Some("echo"));
        assert!(!providers.is_empty());
        assert!(AvailableProviders::new().is_empty());
    }

    #[test]
    fn test_recognized_runs_field_rules() {
        let result = Echo
            .process_document("氏名 田中太郎\n国籍 ベトナム".as_bytes(), DocumentType::ResidenceCard)
            .unwrap();
        assert!(result.success);
        assert_eq!(result.value("nationality"), Some("Vietnam"));
        assert_eq!(result.value("card_number"), None);
    }

    #[test]
    fn test_from_config_respects_disabled() {
        let mut config = ProvidersConfig::default();
        config.cloud.enabled = false;
        config.onnx.enabled = false;
        config.tesseract.enabled = false;
        assert!(AvailableProviders::from_config(&config).is_empty());
    }

    #[test]
    fn test_slot_method() {
        assert_eq!(ProviderSlot::C.method(), ExtractionMethod::ProviderC);
        assert_eq!(ProviderSlot::A.to_string(), "provider_a");
    }
}
