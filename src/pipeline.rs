use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use image::{GrayImage, ImageReader, RgbImage};
use tracing::{debug, info, info_span};

use crate::classifier::{Classifier, RandomClassifier};
use crate::detection::{TesseractExtractor, TextExtractor};
use crate::error::PipelineError;
use crate::inpaint::{self, MaskHandoff, telea};
use crate::models::Classification;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Settings shared by every line of a run
#[derive(Clone, Debug)]
pub struct PipelineContext {
    pub radius: u32,
    pub handoff: MaskHandoff,
    pub debug: Option<DebugConfig>,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            radius: telea::DEFAULT_RADIUS,
            handoff: MaskHandoff::default(),
            debug: None,
        }
    }
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Load an image from disk as 8-bit RGB.
///
/// The format is guessed from the file content, falling back to the
/// extension, so mislabelled or extensionless files still decode.
pub fn load_image(path: &Path) -> Result<RgbImage, PipelineError> {
    let decode_err = |source: image::ImageError| PipelineError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_err)?;
    Ok(img.to_rgb8())
}

/// Image -> text and boxes -> mask -> inpainted image -> verdict.
///
/// Holds no state between images apart from whatever the extractor and
/// classifier cache (OCR models, random generator).
pub struct Pipeline {
    extractor: Box<dyn TextExtractor>,
    classifier: Box<dyn Classifier>,
    context: PipelineContext,
}

impl Pipeline {
    /// Tesseract with the default language set, random placeholder classifier
    pub fn new() -> Self {
        Self {
            extractor: Box::new(TesseractExtractor::new()),
            classifier: Box::new(RandomClassifier::new()),
            context: PipelineContext::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.context.radius = radius;
        self
    }

    pub fn with_handoff(mut self, handoff: MaskHandoff) -> Self {
        self.context.handoff = handoff;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Run every stage on one image file.
    ///
    /// `index` only names the debug output directory.
    pub fn process_path(&self, index: usize, path: &Path) -> Result<Classification, PipelineError> {
        let image = load_image(path)?;
        let (width, height) = image.dimensions();
        debug!(width, height, "image loaded");

        let detection = self
            .extractor
            .extract(&image)
            .map_err(|e| PipelineError::Ocr {
                engine: self.extractor.name().to_string(),
                message: format!("{e:#}"),
            })?;
        debug!(
            boxes = detection.boxes.len(),
            chars = detection.text.chars().count(),
            "text extracted"
        );

        let mask = inpaint::build_mask(width, height, &detection.boxes);
        let mask = self.context.handoff.round_trip(mask)?;
        debug!(masked = inpaint::mask::masked_pixels(&mask), "mask built");

        let inpainted = inpaint::inpaint_telea(&image, &mask, self.context.radius)?;

        let classification = self
            .classifier
            .classify(&inpainted, &detection.text)
            .map_err(|e| self.classifier_error(format!("{e:#}")))?;
        if !classification.is_valid() {
            return Err(self.classifier_error(format!(
                "probability {} outside [0, 1]",
                classification.probability
            )));
        }
        debug!(
            probability = classification.probability,
            label = classification.label,
            "classified"
        );

        self.save_debug_output(index, path, &image, &mask, &inpainted)?;

        Ok(classification)
    }

    fn classifier_error(&self, message: String) -> PipelineError {
        PipelineError::Classifier {
            classifier: self.classifier.name().to_string(),
            message,
        }
    }

    /// Save debug output if debug mode is enabled
    fn save_debug_output(
        &self,
        index: usize,
        path: &Path,
        image: &RgbImage,
        mask: &GrayImage,
        inpainted: &RgbImage,
    ) -> Result<(), PipelineError> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().replace(' ', "_"))
            .unwrap_or_else(|| "image".to_string());
        let line_dir = debug_config
            .output_dir
            .join(format!("{:04}_{}", index + 1, stem));
        std::fs::create_dir_all(&line_dir)?;

        let save_err = |e: image::ImageError| {
            PipelineError::Io(io::Error::other(format!("failed to save debug image: {e}")))
        };
        image.save(line_dir.join("00_input.png")).map_err(save_err)?;
        mask.save(line_dir.join("01_mask.png")).map_err(save_err)?;
        inpainted.save(line_dir.join("02_inpainted.png")).map_err(save_err)?;

        debug!(dir = %line_dir.display(), "debug images saved");
        Ok(())
    }

    /// Drive the pipeline from newline-delimited paths.
    ///
    /// Writes `probability<TAB>label` per successful line to `out` and
    /// `path: error` per failed line to `err`, then moves on. Only failing to
    /// read the input or write the output streams ends the run early.
    pub fn run<R: BufRead, W: Write, E: Write>(
        &self,
        input: R,
        out: &mut W,
        err: &mut E,
    ) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (index, raw) in input.split(b'\n').enumerate() {
            let raw = raw?;
            summary.processed += 1;

            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    let failure = PipelineError::InvalidInput(format!(
                        "line {} is not UTF-8: {e}",
                        index + 1
                    ));
                    debug!(kind = failure.kind(), "line skipped");
                    writeln!(err, "{failure}")?;
                    err.flush()?;
                    summary.failed += 1;
                    continue;
                }
            };
            let path = line.trim_end();

            let span = info_span!("line", index = index + 1, path);
            let _enter = span.enter();

            match self.process_path(index, Path::new(path)) {
                Ok(classification) => {
                    writeln!(out, "{classification}")?;
                    out.flush()?;
                    summary.succeeded += 1;
                }
                Err(failure) => {
                    debug!(kind = failure.kind(), "line failed");
                    writeln!(err, "{path}: {failure}")?;
                    err.flush()?;
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "input exhausted"
        );
        Ok(summary)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
