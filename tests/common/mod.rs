#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from memeguard for tests
pub use memeguard::{
    BoundingBox, Classification, ConstantClassifier, DetectionResult, MaskHandoff, Pipeline,
    PipelineError, RunSummary,
};
