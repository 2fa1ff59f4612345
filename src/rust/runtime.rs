//! ONNX Runtime environment and session setup.

use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::sync::OnceLock;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Graph optimization applied when a session is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    #[default]
    All,
}

impl From<OptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OptimizationLevel) -> Self {
        match level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
            OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
            OptimizationLevel::All => GraphOptimizationLevel::Level3,
        }
    }
}

/// Thread counts of 0 let ONNX Runtime decide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

impl RuntimeConfig {
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = threads;
        self
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads;
        self
    }

    pub fn with_optimization_level(mut self, level: OptimizationLevel) -> Self {
        self.optimization_level = level;
        self
    }
}

fn init_onnx_environment() -> OrtResult<()> {
    ort::init()
        .with_name("swifttrust-vision")
        .commit()?;
    Ok(())
}

/// Initializes the process-wide ONNX Runtime environment exactly once.
/// Later calls return the outcome of the first.
pub fn ensure_initialized() -> Result<(), String> {
    INIT.get_or_init(|| init_onnx_environment().map_err(|e| e.to_string()))
        .clone()
}

pub fn create_session_builder(config: &RuntimeConfig) -> OrtResult<SessionBuilder> {
    if let Err(msg) = ensure_initialized() {
        log::warn!("ONNX Runtime environment init failed, using defaults: {}", msg);
    }
    log::debug!("Session config: {:?}", config);

    let mut builder = Session::builder()?;
    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }
    builder.with_optimization_level(config.optimization_level.into())
}
