//! Classifier artifact storage.
//!
//! Artifacts live as `<name>.safetensors` in a models directory, by default
//! `XDG_DATA_HOME/blurgate/models`. Installs copy a local file into a
//! temporary file in that directory, which is renamed into place only after
//! the optional SHA-256 check passes, so a failed install never leaves a
//! partial artifact behind. Nothing here touches the network.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the blur classifier artifact.
pub const CLASSIFIER_NAME: &str = "blur_classifier";

/// File extension of classifier artifacts.
pub const MODEL_EXTENSION: &str = "safetensors";

const CHUNK_SIZE: usize = 64 * 1024;

/// Progress callback: `(name, bytes_done, bytes_total)`.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

/// An artifact present in the models directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledModel {
    /// Artifact name without extension.
    pub name: String,
    /// Full path to the artifact.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// A directory of classifier artifacts.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(default_models_dir())
    }
}

/// Returns the default models directory path.
///
/// Uses `XDG_DATA_HOME/blurgate/models` or `~/.local/share/blurgate/models`.
#[must_use]
pub fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("blurgate")
        .join("models")
}

impl ModelStore {
    /// Creates a store rooted at `dir`. The directory is created on first install.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The models directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an artifact named `name` would have.
    #[must_use]
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{MODEL_EXTENSION}"))
    }

    /// Path of the blur classifier artifact.
    #[must_use]
    pub fn classifier_path(&self) -> PathBuf {
        self.model_path(CLASSIFIER_NAME)
    }

    /// The blur classifier path, if the artifact is installed.
    #[must_use]
    pub fn installed_classifier(&self) -> Option<PathBuf> {
        Some(self.classifier_path()).filter(|p| p.is_file())
    }

    /// Lists installed artifacts sorted by name.
    ///
    /// A missing directory lists as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<InstalledModel>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read models directory: {}", self.dir.display()))?;

        let mut models = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_model = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == MODEL_EXTENSION);
            if !is_model || !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            models.push(InstalledModel {
                name: name.to_string(),
                path: path.clone(),
                size,
            });
        }

        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }

    /// Copies the local artifact at `source` into the store as `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name or checksum is malformed
    /// - `source` is not a readable regular file
    /// - The checksum does not match
    /// - The artifact cannot be written into the models directory
    pub fn install_file(
        &self,
        name: &str,
        source: &Path,
        sha256: Option<&str>,
        progress: Option<&ProgressCallback>,
    ) -> Result<PathBuf> {
        validate_name(name)?;
        let expected = sha256.map(normalize_checksum).transpose()?;

        if !source.is_file() {
            anyhow::bail!("Model source is not a local file: {}", source.display());
        }

        info!("Installing model {name} from {}", source.display());
        let file = fs::File::open(source)
            .with_context(|| format!("Failed to open model source: {}", source.display()))?;
        let total = file.metadata().ok().map(|m| m.len());
        self.install(name, file, total, expected.as_deref(), progress)
    }

    /// Streams `reader` into the store as artifact `name`.
    ///
    /// `expected_sha256` must be lowercase hex when given.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, hashing or writing fails, or the checksum
    /// does not match.
    pub fn install(
        &self,
        name: &str,
        mut reader: impl Read,
        total: Option<u64>,
        expected_sha256: Option<&str>,
        progress: Option<&ProgressCallback>,
    ) -> Result<PathBuf> {
        validate_name(name)?;
        fs::create_dir_all(&self.dir).context("Failed to create models directory")?;

        let mut staging = tempfile::NamedTempFile::new_in(&self.dir)
            .context("Failed to create temporary model file")?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut done = 0u64;

        loop {
            let n = reader
                .read(&mut buf)
                .with_context(|| format!("Failed to read data for {name}"))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            staging
                .write_all(&buf[..n])
                .with_context(|| format!("Failed to write {name}"))?;
            done += n as u64;
            if let Some(cb) = progress {
                cb(name, done, total);
            }
        }

        let hash = format!("{:x}", hasher.finalize());
        let target = self.model_path(name);

        match expected_sha256 {
            Some(expected) if expected != hash => {
                anyhow::bail!(
                    "Checksum mismatch for {name}: expected {expected}, got {hash}. \
                     Nothing was written to {}.",
                    target.display()
                );
            }
            Some(_) => debug!("Checksum verified for {name}"),
            None => debug!("No checksum given for {name}, sha256 is {hash}"),
        }

        staging
            .persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to install {}", target.display()))?;

        info!("Installed {name} ({done} bytes)");
        Ok(target)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        anyhow::bail!("Invalid model name '{name}': use letters, digits, '_' or '-'")
    }
}

fn normalize_checksum(raw: &str) -> Result<String> {
    let hex = raw.trim().to_ascii_lowercase();
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hex)
    } else {
        anyhow::bail!("Invalid SHA-256 checksum '{raw}': expected 64 hex digits")
    }
}
