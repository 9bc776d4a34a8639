//! Tesseract command-line backend.

use std::io::Write;
use std::process::Command;

use tracing::{debug, trace};

use super::{recognized, BackendKind, Provider};
use crate::error::ProviderError;
use crate::models::config::TesseractConfig;
use crate::models::document::{DocumentType, ProviderResult};

/// Runs the `tesseract` executable on a temporary copy of the image.
pub struct TesseractProvider {
    config: TesseractConfig,
}

impl TesseractProvider {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    fn args(&self, input: &std::path::Path) -> Vec<String> {
        vec![
            input.display().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.config.languages.join("+"),
            "--psm".to_string(),
            self.config.page_segmentation_mode.to_string(),
        ]
    }
}

impl Provider for TesseractProvider {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn process_document(
        &self,
        image: &[u8],
        document_type: DocumentType,
    ) -> Result<ProviderResult, ProviderError> {
        let mut input = tempfile::Builder::new()
            .prefix("kiroku-")
            .suffix(".img")
            .tempfile()
            .map_err(|e| ProviderError::Backend(format!("temp file: {}", e)))?;
        input
            .write_all(image)
            .and_then(|_| input.flush())
            .map_err(|e| ProviderError::Backend(format!("temp file: {}", e)))?;

        let args = self.args(input.path());
        trace!("Running {} {:?}", self.config.command, args);

        let output = Command::new(&self.config.command)
            .args(&args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProviderError::Unavailable(format!("{} not installed", self.config.command))
                } else {
                    ProviderError::Backend(format!("failed to run {}: {}", self.config.command, e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Backend(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        debug!("Tesseract returned {} chars", text.chars().count());
        Ok(recognized(document_type, text.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let provider = TesseractProvider::new(TesseractConfig::default());
        let args = provider.args(std::path::Path::new("/tmp/x.img"));
        assert_eq!(args, vec!["/tmp/x.img", "stdout", "-l", "jpn+eng", "--psm", "6"]);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let provider = TesseractProvider::new(TesseractConfig {
            command: "kiroku-no-such-tesseract-binary".to_string(),
            ..TesseractConfig::default()
        });
        let err = provider
            .process_document(b"\x89PNG", DocumentType::ResidenceCard)
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
