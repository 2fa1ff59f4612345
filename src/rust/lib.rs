//! Emergency image verification backed by a pretrained ImageNet classifier.
//!
//! An uploaded image is classified by MobileNetV2 (ONNX Runtime), and the
//! top-5 labels are scanned for keywords of a small danger taxonomy
//! (fire, flood, accident, weapon).
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use swifttrust_vision::{Assessment, BuiltinModel, Classifier, ModelManager};
//!
//! let manager = ModelManager::new_default()?;
//! manager.ensure_model_downloaded(BuiltinModel::MobileNetV2).await?;
//!
//! let classifier = Classifier::builder()
//!     .with_model_from(&manager, BuiltinModel::MobileNetV2)?
//!     .build()?;
//!
//! let bytes = std::fs::read("report.jpg")?;
//! let assessment = Assessment::from_predictions(classifier.predict(&bytes, 5)?);
//! if assessment.verified {
//!     println!("{:?} ({:.1}%)", assessment.detected_category, assessment.confidence * 100.0);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! `server::create_router` wraps any [`ImagePredictor`] in the `/health` and
//! `/predict` routes; the classifier is shared through an `Arc` and inference
//! runs on tokio's blocking pool.

pub mod classifier;
pub mod config;
pub mod danger;
mod runtime;
pub mod model_manager;
pub mod models;
pub mod server;

pub use classifier::{Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, ImagePredictor, Prediction};
pub use danger::{Assessment, DangerCategory, DANGER_KEYWORDS};
pub use runtime::{OptimizationLevel, RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};

/// Initializes `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
