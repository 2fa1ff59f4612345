use std::path::Path;
use std::sync::Arc;
use ort::session::Session;
use log::{info, error};

use super::error::ClassifierError;
use super::inference::ImageInference;
use super::classifier::Classifier;
use super::labels::{load_labels, ClassLabel};
use crate::{BuiltinModel, ModelCharacteristics, runtime::{RuntimeConfig, create_session_builder}, ModelManager};

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_name: Option<String>,
    model_path: Option<String>,
    labels_path: Option<String>,
    session: Option<Session>,
    labels: Option<Vec<ClassLabel>>,
    model_characteristics: Option<ModelCharacteristics>,
    runtime_config: RuntimeConfig,
}

impl ImageInference for ClassifierBuilder {
    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn characteristics(&self) -> Option<&ModelCharacteristics> {
        self.model_characteristics.as_ref()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use swifttrust_vision::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    /// Must be called before the model is loaded to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads a built-in model from the default cache directory.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - A model is already set
    ///   - The model is not downloaded
    ///   - The model or labels failed to load
    ///   - The model structure is invalid
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        let manager = ModelManager::new_default()
            .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;
        self.with_model_from(&manager, model)
    }

    /// Loads a built-in model from the cache managed by `manager`.
    pub fn with_model_from(mut self, manager: &ModelManager, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model and labels paths already set".to_string()));
        }

        let (model_path, labels_path) = manager.require_model(model)?;
        self.load(&model_path, &labels_path, model.characteristics())?;
        self.model_name = Some(model.display_name().to_string());
        Ok(self)
    }

    /// Loads a custom ONNX classification model and its label file.
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `labels_path` - Path to the label file, one class per line
    /// * `characteristics` - Input geometry and normalization. Defaults to
    ///   224×224 with ImageNet mean/std.
    ///
    /// The number of classes is taken from the label file and checked
    /// against the model output with a warm-up inference.
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        labels_path: &str,
        characteristics: Option<ModelCharacteristics>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || labels_path.is_empty() {
            return Err(ClassifierError::BuildError("Model and labels paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model and labels paths already set".to_string()));
        }
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path)));
        }
        if !Path::new(labels_path).exists() {
            return Err(ClassifierError::BuildError(format!("Labels file not found: {}", labels_path)));
        }

        let characteristics = characteristics.unwrap_or_default();
        self.load(Path::new(model_path), Path::new(labels_path), characteristics)?;

        let name = Path::new(model_path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "custom".to_string());
        self.model_name = Some(name);
        Ok(self)
    }

    fn load(
        &mut self,
        model_path: &Path,
        labels_path: &Path,
        mut characteristics: ModelCharacteristics,
    ) -> Result<(), ClassifierError> {
        let labels = load_labels(labels_path).map_err(|e| {
            error!("Failed to load labels: {}", e);
            e
        })?;
        info!("Loaded {} class labels", labels.len());
        characteristics.num_classes = labels.len();

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.session = Some(session);
        self.model_characteristics = Some(characteristics);
        self.labels = Some(labels);
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.labels_path = Some(labels_path.to_string_lossy().to_string());
        Ok(())
    }

    /// Builds and returns the final Classifier instance.
    ///
    /// Runs one warm-up inference on a blank image so a model/label mismatch
    /// fails here instead of on the first request.
    pub fn build(mut self) -> Result<Classifier, ClassifierError> {
        if self.model_path.is_none() || self.labels_path.is_none() {
            return Err(ClassifierError::BuildError("Model and labels paths must be set".to_string()));
        }

        let model_characteristics = self.model_characteristics
            .clone()
            .ok_or_else(|| ClassifierError::BuildError("Model characteristics not set".to_string()))?;
        let side = model_characteristics.input_size as usize;
        let warm_up = ndarray::Array4::<f32>::zeros((1, 3, side, side));

        let scores = self.run_tensor(warm_up)?;
        if scores.len() != model_characteristics.num_classes {
            return Err(ClassifierError::BuildError(format!(
                "Model outputs {} classes but the label file lists {}",
                scores.len(),
                model_characteristics.num_classes
            )));
        }
        info!("Warm-up inference produced {} class scores", scores.len());

        let session = Arc::new(self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?);
        let labels = Arc::new(self.labels.take()
            .ok_or_else(|| ClassifierError::BuildError("No labels loaded".into()))?);

        Ok(Classifier {
            model_name: self.model_name.take().unwrap_or_else(|| "custom".to_string()),
            model_path: self.model_path.take().unwrap_or_default(),
            labels_path: self.labels_path.take().unwrap_or_default(),
            session,
            labels,
            model_characteristics,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.len() != 1 {
            return Err(ClassifierError::ModelError(
                format!("Model must have exactly 1 image input, found {}", session.inputs.len())
            ));
        }

        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for class scores".to_string()
            ));
        }

        Ok(())
    }
}
