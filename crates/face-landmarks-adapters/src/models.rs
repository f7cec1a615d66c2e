//! Model downloading and caching adapter.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Environment variable naming the base URL models are fetched from.
pub const BASE_URL_ENV: &str = "FACE_LANDMARKS_MODELS_URL";

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Filename in the models directory and under the base URL.
    pub filename: &'static str,
    /// Expected SHA-256 of the file, when pinned.
    pub sha256: Option<&'static str>,
}

/// Models required by the detector.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "blazeface",
        filename: "blazeface.safetensors",
        sha256: None,
    },
    ModelInfo {
        name: "landmarks68",
        filename: "landmarks68.safetensors",
        sha256: None,
    },
];

/// Called with `(model name, bytes downloaded, total bytes if known)`.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

static MODELS_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Overrides the models directory for this process. `None` restores the default.
pub fn set_models_dir(dir: Option<PathBuf>) {
    *MODELS_DIR_OVERRIDE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = dir;
}

/// Returns the models directory path.
///
/// Uses the override from [`set_models_dir`] if set, otherwise
/// `XDG_DATA_HOME/face-landmarks/models` or `~/.local/share/face-landmarks/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    if let Some(dir) = MODELS_DIR_OVERRIDE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
    {
        return dir;
    }
    default_models_dir()
}

fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("face-landmarks")
        .join("models")
}

/// Returns the path to a specific model file.
#[must_use]
pub fn model_path(name: &str) -> Option<PathBuf> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| models_dir().join(m.filename))
}

/// Lists known models with whether each is installed.
#[must_use]
pub fn list_models() -> Vec<(String, bool)> {
    let dir = models_dir();
    MODELS
        .iter()
        .map(|m| (m.name.to_string(), dir.join(m.filename).exists()))
        .collect()
}

/// Checks if all models are installed.
#[must_use]
pub fn all_models_installed() -> bool {
    list_models().iter().all(|(_, installed)| *installed)
}

/// Downloads every model missing from the models directory.
///
/// Files are fetched from `<base_url>/<filename>`.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - A download fails
/// - A pinned checksum doesn't match
pub fn ensure_models_with_progress(
    base_url: &str,
    progress: Option<&ProgressCallback>,
) -> Result<()> {
    let dir = models_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create models directory {}", dir.display()))?;

    for model in MODELS {
        let path = dir.join(model.filename);
        if path.exists() {
            debug!("Model {} already exists", model.name);
        } else {
            download_model(base_url, model, &path, progress)?;
        }
    }

    Ok(())
}

/// Joins the base URL and a file name with exactly one slash.
fn model_url(base_url: &str, filename: &str) -> String {
    format!("{}/{filename}", base_url.trim_end_matches('/'))
}

fn download_model(
    base_url: &str,
    model: &ModelInfo,
    path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<()> {
    let url = model_url(base_url, model.filename);
    info!("Downloading model {} from {url}", model.name);

    let mut response = reqwest::blocking::get(&url)
        .with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        anyhow::bail!(
            "Download of {} failed with status: {}",
            model.name,
            response.status()
        );
    }

    let total = response.content_length();
    let mut bytes = Vec::with_capacity(usize::try_from(total.unwrap_or(0)).unwrap_or(0));
    let mut chunk = [0_u8; 64 * 1024];
    loop {
        let n = response
            .read(&mut chunk)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        if let Some(cb) = progress {
            cb(model.name, bytes.len() as u64, total);
        }
    }

    if let Some(expected) = model.sha256 {
        verify_checksum(&bytes, expected).with_context(|| {
            format!(
                "Checksum mismatch for {}. Delete {} and re-run to download a fresh copy.",
                model.name,
                path.display()
            )
        })?;
    } else {
        debug!("No pinned checksum for {}", model.name);
    }

    // Write to a temporary name first so an interrupted run leaves no partial model.
    let partial = path.with_extension("partial");
    fs::write(&partial, &bytes).with_context(|| format!("Failed to write {}", model.name))?;
    fs::rename(&partial, path).with_context(|| format!("Failed to install {}", model.name))?;

    info!("Downloaded {} ({} bytes)", model.name, bytes.len());
    Ok(())
}

fn verify_checksum(bytes: &[u8], expected: &str) -> Result<()> {
    let actual = format!("{:x}", Sha256::digest(bytes));
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        anyhow::bail!("expected {expected}, got {actual}")
    }
}
