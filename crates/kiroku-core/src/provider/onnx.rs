//! Local PaddleOCR engine using `pure-onnx-ocr`.

use std::sync::Mutex;
use std::time::Instant;

use image::GenericImageView;
use tracing::{debug, info};

use super::{recognized, BackendKind, Provider};
use crate::error::ProviderError;
use crate::models::config::OnnxConfig;
use crate::models::document::{DocumentType, ProviderResult};

/// Rows closer than this many pixels are read as one line.
const ROW_BUCKET_PX: f64 = 20.0;

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct OnnxProvider {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    keep_unk: bool,
}

impl OnnxProvider {
    /// Load detection, recognition and dictionary files from the model directory.
    pub fn from_config(config: &OnnxConfig) -> Result<Self, ProviderError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(ProviderError::Unavailable(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            keep_unk: config.keep_unk,
        })
    }
}

impl Provider for OnnxProvider {
    fn name(&self) -> &str {
        "onnx"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn process_document(
        &self,
        image: &[u8],
        document_type: DocumentType,
    ) -> Result<ProviderResult, ProviderError> {
        let start = Instant::now();
        let image =
            image::load_from_memory(image).map_err(|e| ProviderError::InvalidImage(e.to_string()))?;
        let (width, height) = image.dimensions();

        let results = {
            let engine = self
                .engine
                .lock()
                .map_err(|_| ProviderError::Backend("engine lock poisoned".to_string()))?;
            engine
                .run_from_image(&image)
                .map_err(|e| ProviderError::Backend(format!("pure-onnx-ocr: {}", e)))?
        };

        let mut lines: Vec<(f64, f64, String)> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                (x, y, text)
            })
            .collect();

        // Reading order: top to bottom by row bucket, then left to right.
        lines.sort_by(|a, b| {
            let row_a = (a.1 / ROW_BUCKET_PX) as i64;
            let row_b = (b.1 / ROW_BUCKET_PX) as i64;
            row_a
                .cmp(&row_b)
                .then(a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        });

        let text = lines
            .into_iter()
            .map(|(_, _, t)| t)
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            "pure-onnx-ocr read {} regions from {}x{} in {}ms",
            results.len(),
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(recognized(document_type, &text))
    }
}

/// Minimum x and y of a detection polygon.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    polygon
        .exterior()
        .coords()
        .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| (x.min(c.x), y.min(c.y)))
}
