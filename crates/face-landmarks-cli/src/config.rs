//! Configuration file support for face-landmarks.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/face-landmarks/config.toml` (lowest priority)
//! - Project-local: `.face-landmarks.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Face and landmark detector settings.
    pub detector: DetectorSection,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Exit with status 1 when the detector fails.
    pub strict_exit: Option<bool>,
}

/// Detector configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    /// Minimum BlazeFace anchor score (0.0-1.0).
    pub score_threshold: Option<f32>,
    /// IoU above which overlapping detections are suppressed (0.0-1.0).
    pub nms_threshold: Option<f32>,
    /// Minimum confidence for a face to be reported (0.0-1.0).
    pub min_face_confidence: Option<f32>,
    /// Fraction the face box is grown by before landmark regression (0.0-1.0).
    pub crop_padding: Option<f32>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// Base URL model files are downloaded from.
    pub base_url: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/face-landmarks/config.toml`
    /// 2. Project-local: `.face-landmarks.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings
    /// and dropped.
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::load_from(xdg_config_path(), cwd.as_deref())
    }

    /// Loads from an explicit XDG config path and working directory.
    fn load_from(xdg_path: Option<PathBuf>, cwd: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_path {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = cwd.and_then(find_config_in_parents) {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.validate() {
            warn!("{problem}; ignoring it");
        }

        config
    }

    /// Drops every out-of-range value, returning one message per dropped key.
    fn validate(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        let detector = &mut self.detector;
        let ranged = [
            ("detector.score_threshold", &mut detector.score_threshold),
            ("detector.nms_threshold", &mut detector.nms_threshold),
            ("detector.min_face_confidence", &mut detector.min_face_confidence),
            ("detector.crop_padding", &mut detector.crop_padding),
        ];

        for (key, value) in ranged {
            if let Some(t) = *value {
                if !(0.0..=1.0).contains(&t) {
                    problems.push(format!("{key} must be 0.0-1.0, got {t}"));
                    *value = None;
                }
            }
        }

        if let Some(url) = self.models.base_url.take() {
            if url.starts_with("http://") || url.starts_with("https://") {
                self.models.base_url = Some(url);
            } else {
                problems.push(format!(
                    "models.base_url must be an http(s) URL, got '{url}'"
                ));
            }
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.general.strict_exit = other.general.strict_exit.or(self.general.strict_exit);

        self.detector.score_threshold = other
            .detector
            .score_threshold
            .or(self.detector.score_threshold);
        self.detector.nms_threshold = other.detector.nms_threshold.or(self.detector.nms_threshold);
        self.detector.min_face_confidence = other
            .detector
            .min_face_confidence
            .or(self.detector.min_face_confidence);
        self.detector.crop_padding = other.detector.crop_padding.or(self.detector.crop_padding);

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.models.base_url = other.models.base_url.or_else(|| self.models.base_url.take());

        self.output.pretty = other.output.pretty.or(self.output.pretty);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("face-landmarks").join("config.toml"))
}

/// Search for `.face-landmarks.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".face-landmarks.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
