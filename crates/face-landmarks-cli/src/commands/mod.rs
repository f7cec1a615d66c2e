//! CLI command definitions and handlers.

pub mod annotate;
pub mod detect;
pub mod models;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use face_landmarks_adapters::{model_path, models_dir};
use face_landmarks_core::{DetectorConfig, ResultOutput};
use tracing::debug;

use crate::config::AppConfig;

/// Message printed to stdout for any invocation without exactly one
/// `.jpg`/`.jpeg`/`.png` path.
pub const USAGE: &str = "Error: path to .jpg .jpeg or .png image expected";

/// Face Landmarks - detect faces and facial landmarks in an image
#[derive(Parser)]
#[command(name = "face-landmarks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Detection arguments (image path, output flags).
    #[command(flatten)]
    pub detect: detect::DetectArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    /// Run inference on the CPU even if a GPU backend is available
    #[arg(long, global = true)]
    pub cpu: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Annotate every image under one or more paths, one JSON file per image
    Annotate(annotate::AnnotateArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Completed; includes detector errors unless strict exit is on.
    Success,
    /// Image could not be loaded, strict detector error, or subcommand failure.
    Error,
    /// Wrong argument count or unsupported suffix.
    Usage,
}

impl ExitCode {
    /// Numeric status reported to the OS.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Error => 1,
            Self::Usage => 255,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code.code())
    }
}

/// Prints the usage message and returns the usage exit code.
pub fn usage_error(output: &dyn ResultOutput) -> ExitCode {
    if let Err(e) = output.write_message(USAGE).and_then(|()| output.flush()) {
        debug!("Failed to print usage: {e:#}");
    }
    ExitCode::Usage
}

/// Whether a failed parse was aimed at a subcommand, so clap's own error
/// should be shown instead of the image usage message.
#[must_use]
pub fn targets_subcommand(args: &[OsString]) -> bool {
    let cmd = Cli::command();
    let takes_value = |token: &str| {
        cmd.get_arguments()
            .filter(|a| !a.is_positional() && a.get_action().takes_values())
            .any(|a| match token.strip_prefix("--") {
                Some(long) => a.get_long() == Some(long),
                None => {
                    let mut short = token.chars().skip(1);
                    short.next().is_some_and(|c| a.get_short() == Some(c)) && short.next().is_none()
                }
            })
    };

    let mut tokens = args.iter().skip(1).map(|a| a.to_string_lossy());
    while let Some(token) = tokens.next() {
        if token == "--" {
            return false;
        }
        if !token.starts_with('-') {
            return cmd.get_subcommands().any(|sub| sub.get_name() == token);
        }
        if takes_value(&token) {
            tokens.next();
        }
    }
    false
}

/// Builds the detector configuration from config-file values and defaults.
#[must_use]
pub fn detector_config(config: &AppConfig, force_cpu: bool) -> DetectorConfig {
    let defaults = DetectorConfig::default();
    let dir = models_dir();
    let detector = &config.detector;

    DetectorConfig {
        score_threshold: detector.score_threshold.unwrap_or(defaults.score_threshold),
        nms_threshold: detector.nms_threshold.unwrap_or(defaults.nms_threshold),
        min_face_confidence: detector
            .min_face_confidence
            .unwrap_or(defaults.min_face_confidence),
        crop_padding: detector.crop_padding.unwrap_or(defaults.crop_padding),
        force_cpu,
        blazeface_model_path: model_path("blazeface")
            .unwrap_or_else(|| dir.join(&defaults.blazeface_model_path)),
        landmarks_model_path: model_path("landmarks68")
            .unwrap_or_else(|| dir.join(&defaults.landmarks_model_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Error.code(), 1);
        assert_eq!(ExitCode::Usage.code(), 255);
    }

    #[test]
    fn test_targets_subcommand() {
        assert!(targets_subcommand(&args(&["face-landmarks", "models", "bogus"])));
        assert!(targets_subcommand(&args(&["face-landmarks", "-v", "annotate"])));
        assert!(!targets_subcommand(&args(&["face-landmarks", "a.png", "b.png"])));
        assert!(!targets_subcommand(&args(&["face-landmarks", "--bogus"])));
        assert!(!targets_subcommand(&args(&["face-landmarks", "--", "models"])));
    }

    #[test]
    fn test_targets_subcommand_skips_flag_values() {
        assert!(!targets_subcommand(&args(&[
            "face-landmarks",
            "--models-dir",
            "models",
            "--bogus",
            "a.png",
        ])));
        assert!(targets_subcommand(&args(&[
            "face-landmarks",
            "--models-dir",
            "weights",
            "models",
            "bogus",
        ])));
        assert!(!targets_subcommand(&args(&[
            "face-landmarks",
            "--models-dir=models",
            "--bogus",
            "a.png",
        ])));
    }

    #[test]
    fn test_detector_config_uses_config_values() {
        let mut config = AppConfig::default();
        config.detector.score_threshold = Some(0.6);
        config.detector.crop_padding = Some(0.1);

        let detector = detector_config(&config, true);
        assert!((detector.score_threshold - 0.6).abs() < f32::EPSILON);
        assert!((detector.crop_padding - 0.1).abs() < f32::EPSILON);
        assert!((detector.nms_threshold - 0.3).abs() < f32::EPSILON);
        assert!(detector.force_cpu);
        assert!(detector
            .blazeface_model_path
            .ends_with("blazeface.safetensors"));
    }
}
