//! Facial emotion classification for MeetSense.
//!
//! The pipeline is deliberately thin: [`preprocess_image`] turns an upload
//! into a `(1, H, W, 1)` intensity tensor, a [`Classifier`] (normally the
//! Candle [`MiniXception`] loaded once at startup) produces class
//! probabilities, and [`Prediction`] pairs them with the [`Emotion`] labels.

pub mod classifier;
pub mod error;
pub mod labels;
pub mod loader;
pub mod model;
pub mod preprocess;

pub use classifier::{predict_emotion, Classifier, Prediction};
pub use error::{Result, VisionError};
pub use labels::Emotion;
pub use loader::{load_mini_xception, select_device};
pub use model::{MiniXception, INPUT_SHAPE, INPUT_SIZE};
pub use preprocess::preprocess_image;

pub use candle_core::Tensor;
