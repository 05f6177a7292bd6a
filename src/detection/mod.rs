pub mod ocr;
pub mod tesseract;

use anyhow::Result;
use image::RgbImage;

use crate::models::DetectionResult;

pub use ocr::OcrsExtractor;
pub use tesseract::{BoxLevel, TesseractExtractor};

/// Recognises text and text layout in an image.
///
/// Box order is whatever the engine traverses in and must not be relied on.
pub trait TextExtractor {
    fn extract(&self, image: &RgbImage) -> Result<DetectionResult>;

    /// Human-readable engine name (used in logs and errors)
    fn name(&self) -> &str;
}
