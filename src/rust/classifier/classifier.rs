use std::sync::Arc;
use ort::session::Session;

use super::error::ClassifierError;
use super::inference::ImageInference;
use super::labels::ClassLabel;
use super::utils::top_k_indices;
use super::{ClassifierInfo, ImagePredictor, Prediction};
use crate::models::ModelCharacteristics;

/// A thread-safe image classifier backed by an ONNX model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync`: the session and label table are
/// held behind `Arc` and never mutated after `build()`, so one instance can
/// serve any number of concurrent requests.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use swifttrust_vision::{Classifier, BuiltinModel};
///
/// let classifier = Classifier::builder()
///     .with_model(BuiltinModel::MobileNetV2)?
///     .build()?;
///
/// let bytes = std::fs::read("photo.jpg")?;
/// for prediction in classifier.predict(&bytes, 5)? {
///     println!("{}: {:.1}%", prediction.label, prediction.confidence * 100.0);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub model_name: String,
    pub model_path: String,
    pub labels_path: String,
    pub session: Arc<Session>,
    pub labels: Arc<Vec<ClassLabel>>,
    pub model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl ImageInference for Classifier {
    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn characteristics(&self) -> Option<&ModelCharacteristics> {
        Some(&self.model_characteristics)
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_name: self.model_name.clone(),
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            num_classes: self.labels.len(),
            input_size: self.model_characteristics.input_size,
        }
    }

    /// Classifies an encoded image and returns the `k` most likely classes,
    /// highest confidence first.
    ///
    /// `k` larger than the number of classes returns every class.
    ///
    /// # Errors
    /// - `ValidationError` if `k` is zero or the payload is empty
    /// - `ImageError` if the bytes are not a decodable image
    /// - `ModelError` / `PredictionError` if inference fails
    pub fn predict(&self, image: &[u8], k: usize) -> Result<Vec<Prediction>, ClassifierError> {
        if k == 0 {
            return Err(ClassifierError::ValidationError("k must be at least 1".into()));
        }

        let scores = self.class_scores(image)?;
        if scores.len() != self.labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model produced {} scores but {} labels are loaded",
                scores.len(),
                self.labels.len()
            )));
        }

        Ok(top_k_indices(&scores, k)
            .into_iter()
            .map(|i| Prediction {
                class_id: self.labels[i].id.clone(),
                label: self.labels[i].label.clone(),
                confidence: scores[i].clamp(0.0, 1.0),
            })
            .collect())
    }
}

impl ImagePredictor for Classifier {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn predict_top(&self, image: &[u8], k: usize) -> Result<Vec<Prediction>, ClassifierError> {
        self.predict(image, k)
    }
}
