/// Pretrained image classifiers the service knows how to fetch and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// MobileNetV2 trained on ImageNet-1k (ONNX model zoo, opset 12)
    MobileNetV2,
}

/// Static input/output properties of a classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCharacteristics {
    /// Square side length of the input image in pixels
    pub input_size: u32,
    /// Number of output classes
    pub num_classes: usize,
    /// Per-channel RGB mean subtracted after scaling pixels to [0, 1]
    pub mean: [f32; 3],
    /// Per-channel RGB standard deviation
    pub std: [f32; 3],
    /// Approximate size of the weights file
    pub model_size_mb: usize,
    /// Whether the output layer already ends in a softmax. Raw logits
    /// (the ONNX zoo classifiers) are normalized by the classifier.
    pub outputs_probabilities: bool,
}

impl Default for ModelCharacteristics {
    fn default() -> Self {
        Self {
            input_size: 224,
            num_classes: 1000,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            model_size_mb: 0,
            outputs_probabilities: false,
        }
    }
}

/// Where to fetch a model's files and how to verify them.
///
/// Hashes are optional: without a pinned digest the manager records the
/// digest of each completed download and verifies later loads against it.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub labels_url: String,
    pub model_hash: Option<String>,
    pub labels_hash: Option<String>,
}

impl BuiltinModel {
    /// Name reported by the health endpoint
    pub fn display_name(&self) -> &'static str {
        match self {
            BuiltinModel::MobileNetV2 => "MobileNetV2",
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::MobileNetV2 => ModelCharacteristics {
                model_size_mb: 14,
                ..ModelCharacteristics::default()
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BuiltinModel::MobileNetV2 => ModelInfo {
                name: "mobilenetv2".to_string(),
                model_url: "https://github.com/onnx/models/raw/main/validated/vision/classification/mobilenet/model/mobilenetv2-12.onnx".to_string(),
                labels_url: "https://raw.githubusercontent.com/onnx/models/main/validated/vision/classification/synset.txt".to_string(),
                model_hash: None,
                labels_hash: None,
            },
        }
    }
}
