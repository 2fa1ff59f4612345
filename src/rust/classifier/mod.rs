mod error;
mod inference;
mod labels;
mod utils;
pub mod builder;
pub mod preprocess;
#[allow(clippy::module_inception)]
mod classifier;

use serde::Serialize;

pub use error::ClassifierError;
pub use classifier::Classifier;
pub use builder::ClassifierBuilder;
pub use labels::ClassLabel;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Human-readable model name
    pub model_name: String,
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the label file
    pub labels_path: String,
    /// Number of output classes
    pub num_classes: usize,
    /// Side length of the square model input
    pub input_size: u32,
}

/// One scored class returned by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(skip)]
    pub class_id: String,
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(class_id: impl Into<String>, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            class_id: class_id.into(),
            label: label.into(),
            confidence,
        }
    }
}

/// Anything that can rank the classes of an encoded image.
/// Implemented by `Classifier`; the HTTP layer only sees this trait.
pub trait ImagePredictor: Send + Sync {
    /// Name reported by the health endpoint
    fn model_name(&self) -> &str;

    /// The `k` most likely classes, highest confidence first.
    fn predict_top(&self, image: &[u8], k: usize) -> Result<Vec<Prediction>, ClassifierError>;
}
