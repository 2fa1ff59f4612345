//! Command-line and environment configuration for the vision service.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::model_manager::{ModelManager, CACHE_ENV_VAR};
use crate::runtime::{OptimizationLevel, RuntimeConfig};

/// Default listening port of the vision service
pub const DEFAULT_PORT: u16 = 5001;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "VISION_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "VISION_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Cache root for downloaded models (models live under `<dir>/models`)
    #[arg(long, env = CACHE_ENV_VAR)]
    pub cache_dir: Option<PathBuf>,

    /// Maximum accepted request body in megabytes
    #[arg(long, env = "VISION_BODY_LIMIT_MB", default_value_t = 10)]
    pub body_limit_mb: usize,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, env = "VISION_INTRA_THREADS", default_value_t = 0)]
    pub intra_threads: usize,

    /// ONNX Runtime graph optimization level
    #[arg(long, env = "VISION_OPTIMIZATION", value_enum, default_value_t = OptimizationLevel::All)]
    pub optimization_level: OptimizationLevel,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    pub fresh: bool,
}

impl Args {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::default()
            .with_intra_threads(self.intra_threads)
            .with_optimization_level(self.optimization_level)
    }

    pub fn models_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.join("models"),
            None => ModelManager::get_default_models_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["swifttrust-vision"]).unwrap();
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.socket_addr().to_string(), "0.0.0.0:5001");
        assert_eq!(args.body_limit_bytes(), 10 * 1024 * 1024);
        assert_eq!(args.intra_threads, 0);
        assert_eq!(args.runtime_config(), RuntimeConfig::default());
        assert!(!args.fresh);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "swifttrust-vision",
            "--host", "127.0.0.1",
            "--port", "8080",
            "--cache-dir", "/tmp/vision-cache",
            "--body-limit-mb", "2",
            "--intra-threads", "3",
            "--optimization-level", "basic",
            "--fresh",
        ])
        .unwrap();
        assert_eq!(args.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(args.models_dir(), PathBuf::from("/tmp/vision-cache/models"));
        assert_eq!(args.body_limit_bytes(), 2 * 1024 * 1024);
        let runtime = args.runtime_config();
        assert_eq!(runtime.intra_threads, 3);
        assert_eq!(runtime.optimization_level, OptimizationLevel::Basic);
        assert!(args.fresh);
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(Args::try_parse_from(["swifttrust-vision", "--host", "not-an-ip"]).is_err());
    }
}
