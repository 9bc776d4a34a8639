//! Configuration structures for the kiroku pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::document::Strategy;

/// Main configuration for the kiroku pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KirokuConfig {
    /// Provider ordering, deadlines and confidence levels.
    pub orchestrator: OrchestratorConfig,

    /// Roster matching configuration.
    pub identity: IdentityConfig,

    /// Backend configuration for each provider slot.
    pub providers: ProvidersConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Deadline for a single provider call, in seconds.
    pub provider_timeout_secs: u64,

    /// Deadline for all attempts on one document, in seconds.
    pub overall_timeout_secs: u64,

    /// A result is incomplete when more than this share of critical fields is missing.
    pub incomplete_ratio: f32,

    /// Strategy used when the caller does not pick one.
    pub default_strategy: Strategy,

    /// Confidence assigned to each outcome.
    pub confidence: ConfidenceLevels,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 30,
            overall_timeout_secs: 90,
            incomplete_ratio: 0.5,
            default_strategy: Strategy::Auto,
            confidence: ConfidenceLevels::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }
}

/// Confidence scores per outcome; more agreeing providers score higher.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceLevels {
    /// Last-resort provider C alone.
    pub fallback: f32,
    /// One provider alone after the other failed, or an incomplete primary.
    pub degraded_primary: f32,
    /// Complete primary result, or one survivor of a concurrent attempt.
    pub primary: f32,
    /// Primary complemented by the secondary provider.
    pub complemented: f32,
    /// Both providers succeeded concurrently and were merged.
    pub hybrid: f32,
}

impl Default for ConfidenceLevels {
    fn default() -> Self {
        Self {
            fallback: 0.6,
            degraded_primary: 0.7,
            primary: 0.8,
            complemented: 0.9,
            hybrid: 0.95,
        }
    }
}

/// Identity resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Minimum similarity ratio to accept a roster match.
    pub match_threshold: f32,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.70,
        }
    }
}

/// Provider slots: A is the cloud backend, B the ONNX engine, C Tesseract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub cloud: CloudConfig,
    pub onnx: OnnxConfig,
    pub tesseract: TesseractConfig,
}

/// Cloud OCR backend (Vision `images:annotate` compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub enabled: bool,

    /// Annotate endpoint URL.
    pub endpoint: String,

    /// API key; takes precedence over `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Language hints sent with each request.
    pub language_hints: Vec<String>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key: None,
            api_key_env: "KIROKU_CLOUD_API_KEY".to_string(),
            language_hints: vec!["ja".to_string(), "en".to_string()],
        }
    }
}

impl CloudConfig {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Local PaddleOCR engine via `pure-onnx-ocr`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnnxConfig {
    pub enabled: bool,

    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text.
    pub keep_unk: bool,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "japan_rec.onnx".to_string(),
            dictionary: "japan_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OnnxConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

/// Tesseract command-line engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    pub enabled: bool,

    /// Executable name or path.
    pub command: String,

    /// Language packs, joined with `+`.
    pub languages: Vec<String>,

    /// Tesseract `--psm` value.
    pub page_segmentation_mode: u8,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "tesseract".to_string(),
            languages: vec!["jpn".to_string(), "eng".to_string()],
            page_segmentation_mode: 6,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Use embedded page text instead of OCR when there is enough of it.
    pub prefer_embedded_text: bool,

    /// Minimum text length to consider a page as text-based.
    pub min_text_length: usize,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
            max_pages: 0,
        }
    }
}

impl KirokuConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
