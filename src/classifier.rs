use std::sync::Mutex;

use anyhow::{Result, anyhow};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Classification, DEFAULT_THRESHOLD};

/// Decides harmful (1) or benign (0) from the cleaned image and its text.
///
/// Implementations return a probability in [0, 1] and the label derived from
/// it; a real model plugs in here without touching the pipeline.
pub trait Classifier {
    fn classify(&self, image: &RgbImage, text: &str) -> Result<Classification>;

    /// Human-readable classifier name (used in logs and errors)
    fn name(&self) -> &str;
}

/// Placeholder that ignores its inputs and draws the probability uniformly
/// from [0, 1).
pub struct RandomClassifier {
    rng: Mutex<StdRng>,
    threshold: f64,
}

impl RandomClassifier {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Reproducible draws for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Default for RandomClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RandomClassifier {
    fn classify(&self, _image: &RgbImage, _text: &str) -> Result<Classification> {
        let probability = self
            .rng
            .lock()
            .map_err(|_| anyhow!("random generator lock poisoned"))?
            .gen_range(0.0..1.0);
        Ok(Classification::from_probability(probability, self.threshold))
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Always answers with the same probability.
#[derive(Debug, Clone, Copy)]
pub struct ConstantClassifier {
    pub probability: f64,
    pub threshold: f64,
}

impl ConstantClassifier {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Classifier for ConstantClassifier {
    fn classify(&self, _image: &RgbImage, _text: &str) -> Result<Classification> {
        Ok(Classification::from_probability(self.probability, self.threshold))
    }

    fn name(&self) -> &str {
        "constant"
    }
}
