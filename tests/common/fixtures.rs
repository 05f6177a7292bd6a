use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use memeguard::{BoundingBox, Classification, Classifier, DetectionResult, TextExtractor};

/// Writes a solid-colour PNG into `dir` and returns its path.
pub fn write_solid_image(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) -> PathBuf {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let path = dir.join(name);
    img.save(&path).expect("Failed to save test image");
    path
}

/// Writes a flat image with a block of "text" pixels and returns its path.
pub fn write_captioned_image(dir: &Path, name: &str, caption: BoundingBox) -> PathBuf {
    let mut img = RgbImage::from_pixel(40, 30, Rgb([30, 90, 150]));
    let (x, y, w, h) = caption.clamp_to(40, 30).expect("caption inside image");
    for py in y..y + h {
        for px in x..x + w {
            img.put_pixel(px, py, Rgb([255, 255, 255]));
        }
    }
    let path = dir.join(name);
    img.save(&path).expect("Failed to save test image");
    path
}

/// Extractor that reports the same text and boxes for every image.
pub struct StaticExtractor {
    pub result: DetectionResult,
}

impl StaticExtractor {
    pub fn empty() -> Self {
        Self {
            result: DetectionResult::default(),
        }
    }

    pub fn with_boxes(text: &str, boxes: Vec<BoundingBox>) -> Self {
        Self {
            result: DetectionResult::new(text, boxes),
        }
    }
}

impl TextExtractor for StaticExtractor {
    fn extract(&self, _image: &RgbImage) -> anyhow::Result<DetectionResult> {
        Ok(self.result.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Extractor standing in for a broken OCR install.
pub struct FailingExtractor;

impl TextExtractor for FailingExtractor {
    fn extract(&self, _image: &RgbImage) -> anyhow::Result<DetectionResult> {
        anyhow::bail!("language data not found")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Deterministic classifier: probability is the mean red level of the image.
pub struct MeanRedClassifier;

impl Classifier for MeanRedClassifier {
    fn classify(&self, image: &RgbImage, _text: &str) -> anyhow::Result<Classification> {
        let total: u64 = image.pixels().map(|p| u64::from(p[0])).sum();
        let count = u64::from(image.width()) * u64::from(image.height());
        let probability = total as f64 / (count.max(1) as f64 * 255.0);
        Ok(Classification::from_probability(probability, 0.5))
    }

    fn name(&self) -> &str {
        "mean-red"
    }
}

/// Classifier reporting an out-of-range probability.
pub struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn classify(&self, _image: &RgbImage, _text: &str) -> anyhow::Result<Classification> {
        Ok(Classification {
            probability: 1.5,
            label: 1,
        })
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Runs `pipeline` over `input` and returns (stdout, stderr) as strings.
pub fn run_lines(pipeline: &memeguard::Pipeline, input: &str) -> (String, String, memeguard::RunSummary) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let summary = pipeline
        .run(input.as_bytes(), &mut out, &mut err)
        .expect("run should only fail on stream errors");
    (
        String::from_utf8(out).expect("stdout is UTF-8"),
        String::from_utf8(err).expect("stderr is UTF-8"),
        summary,
    )
}
