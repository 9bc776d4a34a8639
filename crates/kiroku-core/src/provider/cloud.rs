//! Cloud OCR backend speaking the Vision `images:annotate` protocol.

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{recognized, BackendKind, Provider};
use crate::error::ProviderError;
use crate::models::config::CloudConfig;
use crate::models::document::{DocumentType, ProviderResult};

/// Cloud document text detection.
pub struct CloudProvider {
    config: CloudConfig,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

impl CloudProvider {
    /// Fails with `Unavailable` when no API key is configured.
    pub fn new(config: CloudConfig) -> Result<Self, ProviderError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ProviderError::Unavailable(format!("no API key in config or ${}", config.api_key_env))
        })?;
        Ok(Self { config, api_key })
    }

    fn request_body(&self, image: &[u8]) -> serde_json::Value {
        let content = base64::engine::general_purpose::STANDARD.encode(image);
        json!({
            "requests": [{
                "image": { "content": content },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }],
                "imageContext": { "languageHints": self.config.language_hints },
            }]
        })
    }
}

impl Provider for CloudProvider {
    fn name(&self) -> &str {
        "cloud"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Cloud
    }

    fn process_document(
        &self,
        image: &[u8],
        document_type: DocumentType,
    ) -> Result<ProviderResult, ProviderError> {
        // The blocking client owns a runtime, so it is built on the worker
        // thread rather than held across async contexts.
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::Backend(format!("HTTP client: {}", e)))?;

        let response = client
            .post(&self.config.endpoint)
            .query(&[("key", &self.api_key)])
            .json(&self.request_body(image))
            .send()
            .map_err(|e| ProviderError::Backend(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Backend(format!("cloud returned {}: {}", status, body)));
        }

        let parsed: AnnotateResponse = response
            .json()
            .map_err(|e| ProviderError::Backend(format!("invalid response: {}", e)))?;

        let first = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Backend("empty response".to_string()))?;

        if let Some(status) = first.error {
            return Err(ProviderError::Backend(status.message));
        }

        let text = first.full_text_annotation.map(|a| a.text).unwrap_or_default();
        debug!("Cloud OCR returned {} chars", text.chars().count());
        Ok(recognized(document_type, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_unavailable() {
        let config = CloudConfig {
            api_key: None,
            api_key_env: "KIROKU_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..CloudConfig::default()
        };
        assert!(matches!(CloudProvider::new(config), Err(ProviderError::Unavailable(_))));
    }

    #[test]
    fn test_request_body() {
        let config = CloudConfig {
            api_key: Some("k".to_string()),
            ..CloudConfig::default()
        };
        let provider = CloudProvider::new(config).unwrap();
        let body = provider.request_body(b"abc");
        assert_eq!(body["requests"][0]["image"]["content"], "YWJj");
        assert_eq!(body["requests"][0]["features"][0]["type"], "DOCUMENT_TEXT_DETECTION");
        assert_eq!(body["requests"][0]["imageContext"]["languageHints"][0], "ja");
    }

    #[test]
    fn test_parse_response() {
        let json = r#"{"responses":[{"fullTextAnnotation":{"text":"氏名 田中太郎\n"}}]}"#;
        let parsed: AnnotateResponse = serde_json::from_str(json).unwrap();
        let text = &parsed.responses[0].full_text_annotation.as_ref().unwrap().text;
        assert!(text.contains("田中太郎"));
    }
}
