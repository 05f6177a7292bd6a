use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while processing a single input line.
///
/// None of these are fatal to a run: the orchestrator reports them and moves
/// on to the next line.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Message omits `path`; `Pipeline::run` prefixes each failure with it.
    #[error("failed to read image: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{engine} OCR failed: {message}")]
    Ocr { engine: String, message: String },

    #[error("mask handoff through {} failed: {message}", .path.display())]
    MaskHandoff { path: PathBuf, message: String },

    #[error("inpainting failed: {0}")]
    Inpaint(String),

    #[error("{classifier} classifier failed: {message}")]
    Classifier { classifier: String, message: String },

    #[error("invalid input line: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Short stable name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Decode { .. } => "decode",
            PipelineError::Ocr { .. } => "ocr",
            PipelineError::MaskHandoff { .. } => "mask_handoff",
            PipelineError::Inpaint(_) => "inpaint",
            PipelineError::Classifier { .. } => "classifier",
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
