//! Error types for preprocessing, model loading and inference.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for vision operations.
pub type Result<T> = std::result::Result<T, VisionError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VisionError {
    /// The upload could not be decoded or turned into a tensor.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Input shape mismatch: expected {expected:?}, got {actual:?}")]
    Shape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("model artifact not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Failed to load model from {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unsupported device: {0}")]
    Device(String),
}

impl From<candle_core::Error> for VisionError {
    fn from(err: candle_core::Error) -> Self {
        VisionError::Inference(err.to_string())
    }
}
