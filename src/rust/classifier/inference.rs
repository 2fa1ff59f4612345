use std::collections::HashMap;

use ndarray::{Array1, Array4};
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::preprocess::image_to_tensor;
use super::utils::softmax;
use crate::models::ModelCharacteristics;

/// Runs a single image through an ONNX classification model.
///
/// The model is expected to:
/// - Accept one `f32` input of shape `[1, 3, H, W]` (NCHW, normalized RGB)
/// - Produce one output of shape `[1, num_classes]` holding logits, or
///   probabilities when `ModelCharacteristics::outputs_probabilities` is set
pub(crate) trait ImageInference {
    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the input geometry and normalization of the model
    fn characteristics(&self) -> Option<&ModelCharacteristics>;

    /// Decodes and normalizes image bytes into the model's input tensor.
    fn preprocess(&self, bytes: &[u8]) -> Result<Array4<f32>, ClassifierError> {
        let characteristics = self.characteristics()
            .ok_or_else(|| ClassifierError::ModelError("Model characteristics not set".into()))?;
        image_to_tensor(bytes, characteristics)
    }

    /// Class probabilities for the given image bytes.
    fn class_scores(&self, bytes: &[u8]) -> Result<Array1<f32>, ClassifierError> {
        let tensor = self.preprocess(bytes)?;
        self.run_tensor(tensor)
    }

    /// Runs the model on an already prepared input tensor.
    ///
    /// # Errors
    /// - `ModelError` if the session is not initialized
    /// - `ModelError` if tensor creation, execution or output extraction fails
    /// - `PredictionError` if the model returns no scores
    fn run_tensor(&self, input: Array4<f32>) -> Result<Array1<f32>, ClassifierError> {
        let session = self.session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;
        let characteristics = self.characteristics()
            .ok_or_else(|| ClassifierError::ModelError("Model characteristics not set".into()))?;
        let input_name = session.inputs.first()
            .map(|input| input.name.as_str())
            .ok_or_else(|| ClassifierError::ModelError("Model has no inputs".into()))?;

        let input_dyn = input.into_dyn();
        let input_std = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(input_name, Tensor::from_array(&input_std)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        let scores = Array1::from_iter(output_tensor.iter().cloned());
        if scores.is_empty() {
            return Err(ClassifierError::PredictionError("Model returned no scores".into()));
        }

        Ok(to_probabilities(scores, characteristics))
    }
}

/// Normalizes raw model output according to what the model declares it emits.
pub(crate) fn to_probabilities(scores: Array1<f32>, characteristics: &ModelCharacteristics) -> Array1<f32> {
    if characteristics.outputs_probabilities {
        scores
    } else {
        softmax(&scores)
    }
}
