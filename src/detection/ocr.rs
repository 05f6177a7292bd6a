use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use image::RgbImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::debug;

use crate::detection::TextExtractor;
use crate::models::{BoundingBox, DetectionResult};

pub const DETECTION_MODEL: &str = "text-detection.rten";
pub const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Standard ocrs model cache, `~/.cache/ocrs`
pub fn default_model_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize OCR engine with the detection and recognition models in `model_dir`
pub fn init_ocr_engine(model_dir: &Path) -> Result<OcrEngine> {
    let detection_model_path = model_dir.join(DETECTION_MODEL);
    let recognition_model_path = model_dir.join(RECOGNITION_MODEL);

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        anyhow::bail!(
            "OCR models not found. Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        );
    }

    let detection_model = Model::load_file(&detection_model_path)?;
    let recognition_model = Model::load_file(&recognition_model_path)?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })?;

    Ok(engine)
}

/// Text extraction with the pure-Rust ocrs models.
///
/// Produces one box per recognised text line.
pub struct OcrsExtractor {
    model_dir: PathBuf,
    // Loaded on first use so a missing model only fails the lines that need it
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl OcrsExtractor {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            engine: Mutex::new(None),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    fn engine(&self) -> Result<Arc<OcrEngine>> {
        let mut engine_guard = self
            .engine
            .lock()
            .map_err(|_| anyhow!("OCR engine lock poisoned"))?;

        if let Some(engine) = engine_guard.as_ref() {
            return Ok(engine.clone());
        }

        debug!(model_dir = %self.model_dir.display(), "initializing ocrs engine");
        let engine = Arc::new(init_ocr_engine(&self.model_dir)?);
        *engine_guard = Some(engine.clone());
        Ok(engine)
    }
}

impl TextExtractor for OcrsExtractor {
    fn extract(&self, image: &RgbImage) -> Result<DetectionResult> {
        let engine = self.engine()?;

        let img_source = ImageSource::from_bytes(image.as_raw(), image.dimensions())
            .map_err(|e| anyhow!("invalid OCR input: {e:?}"))?;
        let ocr_input = engine.prepare_input(img_source)?;

        let word_rects = engine.detect_words(&ocr_input)?;
        let line_rects = engine.find_text_lines(&ocr_input, &word_rects);
        let line_texts = engine.recognize_text(&ocr_input, &line_rects)?;

        let mut lines = Vec::new();
        let mut boxes = Vec::new();

        for (rects, text) in line_rects.iter().zip(line_texts.iter()) {
            let Some(text) = text else { continue };
            let text = text.to_string();
            if text.trim().is_empty() {
                continue;
            }

            let corners = rects
                .iter()
                .flat_map(|rect| rect.corners())
                .map(|corner| (corner.x, corner.y));
            let Some(bbox) = enclosing_box(corners) else {
                continue;
            };
            boxes.push(bbox);
            lines.push(text);
        }

        debug!(lines = lines.len(), "ocrs recognised text lines");
        Ok(DetectionResult::new(lines.join("\n"), boxes))
    }

    fn name(&self) -> &str {
        "ocrs"
    }
}

/// Smallest pixel-aligned box containing every point, `None` when degenerate.
fn enclosing_box(points: impl IntoIterator<Item = (f32, f32)>) -> Option<BoundingBox> {
    let mut left = f32::MAX;
    let mut top = f32::MAX;
    let mut right = f32::MIN;
    let mut bottom = f32::MIN;
    for (x, y) in points {
        left = left.min(x);
        top = top.min(y);
        right = right.max(x);
        bottom = bottom.max(y);
    }
    if right <= left || bottom <= top {
        return None;
    }

    let x = left.floor();
    let y = top.floor();
    Some(BoundingBox::new(
        x as i32,
        y as i32,
        (right.ceil() - x) as u32,
        (bottom.ceil() - y) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_models_fail_per_call() {
        let dir = tempfile::TempDir::new().unwrap();
        let extractor = OcrsExtractor::new(dir.path());
        let err = extractor.extract(&RgbImage::new(8, 8)).unwrap_err();
        assert!(err.to_string().contains("OCR models not found"));

        // still failing, nothing cached
        assert!(extractor.extract(&RgbImage::new(8, 8)).is_err());
    }

    #[test]
    fn line_box_encloses_every_word_corner() {
        // two slightly rotated words on one line
        let corners = [
            (10.4, 20.0), (40.0, 19.2), (40.6, 31.0), (10.0, 32.0),
            (45.0, 18.5), (80.2, 19.0), (80.0, 30.7), (45.3, 31.4),
        ];
        assert_eq!(enclosing_box(corners), Some(BoundingBox::new(10, 18, 71, 14)));
    }

    #[test]
    fn degenerate_line_has_no_box() {
        assert_eq!(enclosing_box(Vec::<(f32, f32)>::new()), None);
        assert_eq!(enclosing_box([(5.0, 5.0), (9.0, 5.0)]), None);
    }
}
