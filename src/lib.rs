pub mod classifier;
pub mod detection;
pub mod error;
pub mod inpaint;
pub mod manifest;
pub mod models;
pub mod pipeline;

pub use classifier::{Classifier, ConstantClassifier, RandomClassifier};
pub use detection::{BoxLevel, OcrsExtractor, TesseractExtractor, TextExtractor};
pub use error::PipelineError;
pub use inpaint::{MaskHandoff, build_mask, inpaint_telea};
pub use models::{BoundingBox, Classification, DetectionResult};
pub use pipeline::{Pipeline, PipelineContext, RunSummary, load_image};

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `debug` when verbose.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
