use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::BuiltinModel;

/// Environment variable overriding the cache root
pub const CACHE_ENV_VAR: &str = "SWIFTTRUST_CACHE";

const MODEL_FILE: &str = "model.onnx";
const LABELS_FILE: &str = "labels.txt";
const DIGEST_SUFFIX: &str = "sha256";
const PARTIAL_SUFFIX: &str = "part";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

#[derive(Clone, Debug)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn digest_path(path: &Path) -> PathBuf {
    sibling_path(path, DIGEST_SUFFIX)
}

fn partial_path(path: &Path) -> PathBuf {
    sibling_path(path, PARTIAL_SUFFIX)
}

/// Moves fully written bytes into place. The digest is recorded before the
/// rename, so `path` never appears without the digest of its complete
/// contents, and an interrupted write only ever leaves a `.part` file.
fn commit_file(path: &Path, bytes: &[u8], hash: &str) -> io::Result<()> {
    let partial = partial_path(path);
    fs::write(&partial, bytes)?;
    fs::write(digest_path(path), hash)?;
    fs::rename(&partial, path)
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("swifttrust").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("swifttrust").join("models");
        }

        env::temp_dir().join("swifttrust").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        let info = model.get_model_info();
        self.models_dir.join(info.name).join(MODEL_FILE)
    }

    pub fn get_labels_path(&self, model: BuiltinModel) -> PathBuf {
        let info = model.get_model_info();
        self.models_dir.join(info.name).join(LABELS_FILE)
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        let model_path = self.get_model_path(model);
        let labels_path = self.get_labels_path(model);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("Labels path: {:?} (exists: {})", labels_path, labels_path.exists());
        model_path.exists() && labels_path.exists()
    }

    /// Returns the model and labels paths, failing if either is missing.
    pub fn require_model(&self, model: BuiltinModel) -> Result<(PathBuf, PathBuf), ModelError> {
        if !self.is_model_downloaded(model) {
            return Err(ModelError::NotDownloaded(format!("{:?}", model)));
        }
        Ok((self.get_model_path(model), self.get_labels_path(model)))
    }

    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let info = model.get_model_info();
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(model);
        let model_result = self
            .ensure_file(&info.model_url, &model_path, info.model_hash.as_deref(), "model")
            .await;

        let labels_path = self.get_labels_path(model);
        let labels_result = self
            .ensure_file(&info.labels_url, &labels_path, info.labels_hash.as_deref(), "labels")
            .await;

        match (model_result, labels_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model and labels ready to use");
                Ok(())
            }
            (Err(e), _) => {
                log::error!("Failed to setup model file: {}", e);
                let _ = self.remove_download(model);
                Err(e)
            }
            (_, Err(e)) => {
                log::error!("Failed to setup labels file: {}", e);
                let _ = self.remove_download(model);
                Err(e)
            }
        }
    }

    /// Downloads `path` unless it already exists and verifies.
    async fn ensure_file(
        &self,
        url: &str,
        path: &Path,
        pinned_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        if path.exists() {
            log::info!("{} file exists at {:?}, verifying...", file_type, path);
            if self.verify_file(path, pinned_hash)? {
                log::info!("Existing {} file verified successfully", file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file_type);
            let _ = fs::remove_file(digest_path(path));
        } else {
            log::info!("{} file does not exist, downloading...", file_type);
        }
        self.download_and_verify_file(url, path, pinned_hash, file_type).await
    }

    /// Digest a file must match: the pinned one, or the one recorded when
    /// the download completed.
    fn expected_hash(&self, path: &Path, pinned_hash: Option<&str>) -> Result<Option<String>, ModelError> {
        if let Some(hash) = pinned_hash {
            return Ok(Some(hash.to_string()));
        }
        let recorded = digest_path(path);
        if recorded.exists() {
            return Ok(Some(fs::read_to_string(recorded)?.trim().to_string()));
        }
        Ok(None)
    }

    fn verify_file(&self, path: &Path, pinned_hash: Option<&str>) -> Result<bool, ModelError> {
        if !path.exists() {
            return Ok(false);
        }
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: {} bytes, sha256 {}", path, bytes.len(), hash);

        match self.expected_hash(path, pinned_hash)? {
            Some(expected) => Ok(hash == expected),
            None => {
                log::warn!("No recorded digest for {:?}, treating it as unverified", path);
                Ok(false)
            }
        }
    }

    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        let info = model.get_model_info();
        let model_path = self.get_model_path(model);
        let labels_path = self.get_labels_path(model);

        if !model_path.exists() || !labels_path.exists() {
            log::info!("One or both model files do not exist");
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, info.model_hash.as_deref())?;
        let labels_ok = self.verify_file(&labels_path, info.labels_hash.as_deref())?;

        log::info!("Verification results: model={}, labels={}", model_ok, labels_ok);
        Ok(model_ok && labels_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        pinned_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = sha256_hex(&bytes);
        if let Some(expected) = pinned_hash {
            if hash != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        commit_file(path, &bytes, &hash)?;

        if !self.verify_file(path, pinned_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        for path in [self.get_model_path(model), self.get_labels_path(model)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
            for leftover in [digest_path(&path), partial_path(&path)] {
                if leftover.exists() {
                    fs::remove_file(leftover)?;
                }
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        log::info!("Checking if model {:?} is downloaded...", model);
        if !self.is_model_downloaded(model) {
            log::info!("Model not found, downloading...");
            self.download_model(model).await?;
        } else if !self.verify_model(model)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(model)?;
            self.download_model(model).await?;
        } else {
            log::info!("Model verification successful");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_manager(name: &str) -> ModelManager {
        let dir = env::temp_dir()
            .join("swifttrust-test")
            .join(format!("{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        ModelManager::new(&dir).unwrap()
    }

    const FAKE_MODEL: &[u8] = b"fake onnx bytes";
    const FAKE_LABELS: &[u8] = b"n00000001 thing\n";

    /// Lays the files down the way a completed download does.
    fn place_files(manager: &ModelManager, model: BuiltinModel) {
        let model_path = manager.get_model_path(model);
        fs::create_dir_all(model_path.parent().unwrap()).unwrap();
        commit_file(&model_path, FAKE_MODEL, &sha256_hex(FAKE_MODEL)).unwrap();
        let labels_path = manager.get_labels_path(model);
        commit_file(&labels_path, FAKE_LABELS, &sha256_hex(FAKE_LABELS)).unwrap();
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var(CACHE_ENV_VAR, "/tmp/test-cache");
        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-cache/models"));
        env::remove_var(CACHE_ENV_VAR);

        let path = ModelManager::get_default_models_dir();
        assert!(path.ends_with("swifttrust/models"));
    }

    #[test]
    fn test_model_paths() {
        let manager = scratch_manager("paths");
        let model = BuiltinModel::MobileNetV2;
        assert!(manager.get_model_path(model).ends_with("mobilenetv2/model.onnx"));
        assert!(manager.get_labels_path(model).ends_with("mobilenetv2/labels.txt"));
        assert!(!manager.is_model_downloaded(model));
        assert!(matches!(manager.require_model(model), Err(ModelError::NotDownloaded(_))));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_committed_files_verify() -> Result<(), ModelError> {
        let manager = scratch_manager("commit");
        let model = BuiltinModel::MobileNetV2;
        assert!(!manager.verify_model(model)?);

        place_files(&manager, model);
        let model_path = manager.get_model_path(model);
        assert!(manager.is_model_downloaded(model));
        assert!(manager.verify_model(model)?);
        assert!(!partial_path(&model_path).exists());
        assert_eq!(fs::read_to_string(digest_path(&model_path))?, sha256_hex(FAKE_MODEL));
        Ok(())
    }

    #[test]
    fn test_file_without_digest_is_unverified() -> Result<(), ModelError> {
        let manager = scratch_manager("nodigest");
        let model = BuiltinModel::MobileNetV2;
        let model_path = manager.get_model_path(model);
        fs::create_dir_all(model_path.parent().unwrap())?;
        // A truncated write left behind with no digest must not be adopted.
        fs::write(&model_path, &FAKE_MODEL[..4])?;
        fs::write(manager.get_labels_path(model), FAKE_LABELS)?;

        assert!(manager.is_model_downloaded(model));
        assert!(!manager.verify_model(model)?);
        assert!(!manager.verify_model(model)?);
        assert!(!digest_path(&model_path).exists());
        Ok(())
    }

    #[test]
    fn test_interrupted_download_leaves_no_model() -> Result<(), ModelError> {
        let manager = scratch_manager("partial");
        let model = BuiltinModel::MobileNetV2;
        let model_path = manager.get_model_path(model);
        fs::create_dir_all(model_path.parent().unwrap())?;
        fs::write(partial_path(&model_path), &FAKE_MODEL[..4])?;

        assert!(!manager.is_model_downloaded(model));
        assert!(!manager.verify_model(model)?);

        manager.remove_download(model)?;
        assert!(!partial_path(&model_path).exists());
        Ok(())
    }

    #[test]
    fn test_corruption_detected() -> Result<(), ModelError> {
        let manager = scratch_manager("corrupt");
        let model = BuiltinModel::MobileNetV2;
        place_files(&manager, model);
        assert!(manager.verify_model(model)?);

        fs::write(manager.get_model_path(model), "corrupted data")?;
        assert!(!manager.verify_model(model)?);
        Ok(())
    }

    #[test]
    fn test_pinned_hash_wins() -> Result<(), ModelError> {
        let manager = scratch_manager("pinned");
        let model = BuiltinModel::MobileNetV2;
        place_files(&manager, model);
        let path = manager.get_model_path(model);

        assert!(manager.verify_file(&path, Some(&sha256_hex(FAKE_MODEL)))?);
        assert!(!manager.verify_file(&path, Some("0000"))?);
        Ok(())
    }

    #[test]
    fn test_remove_download() -> Result<(), ModelError> {
        let manager = scratch_manager("remove");
        let model = BuiltinModel::MobileNetV2;
        place_files(&manager, model);
        manager.verify_model(model)?;

        manager.remove_download(model)?;
        assert!(!manager.is_model_downloaded(model));
        assert!(!digest_path(&manager.get_model_path(model)).exists());
        Ok(())
    }
}
