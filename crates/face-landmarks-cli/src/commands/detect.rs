//! Detect command - print the faces and landmarks of one image as JSON.

use std::path::{Path, PathBuf};

use clap::Args;
use face_landmarks_adapters::load_image;
use face_landmarks_core::{
    records_from_observations, CandleLandmarkDetector, ImageInfo, ImageKind, LandmarkDetector,
    ResultOutput,
};
use tracing::{debug, info, warn};

use super::{detector_config, usage_error, ExitCode};
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for detecting landmarks in a single image.
#[derive(Args, Clone, Default)]
pub struct DetectArgs {
    /// Path to a .jpg, .jpeg or .png image
    #[arg(value_name = "IMAGE")]
    pub paths: Vec<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Exit with status 1 when the detector reports an error
    #[arg(long)]
    pub strict_exit: bool,
}

impl DetectArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Boolean flags passed on the command line always win; config can only
    /// turn them on.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.strict_exit {
            args.strict_exit = config.general.strict_exit.unwrap_or(false);
        }
        args
    }
}

/// Returns the single image path and its kind, or `None` for a usage error.
#[must_use]
pub fn validate_input(paths: &[PathBuf]) -> Option<(&Path, ImageKind)> {
    match paths {
        [path] => ImageKind::from_path(path).map(|kind| (path.as_path(), kind)),
        _ => None,
    }
}

/// Run the detect command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &DetectArgs, config: &AppConfig, force_cpu: bool) -> ExitCode {
    let output = JsonOutput::stdout(args.pretty);

    let Some((path, kind)) = validate_input(&args.paths) else {
        debug!("Rejected arguments: {:?}", args.paths);
        return usage_error(&output);
    };

    let image = match load_image(path, kind) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::Error;
        }
    };

    let detector = CandleLandmarkDetector::new(detector_config(config, force_cpu));
    report(&image, &detector, &output, args.strict_exit)
}

/// Runs one detection and writes either the records or the detector's error.
pub fn report(
    image: &ImageInfo,
    detector: &dyn LandmarkDetector,
    output: &dyn ResultOutput,
    strict_exit: bool,
) -> ExitCode {
    info!(
        "Detecting faces in {} ({}x{}) with {}",
        image.path,
        image.width,
        image.height,
        detector.name()
    );

    let written = match detector.detect(&image.image) {
        Ok(observations) => {
            debug!("{} face(s) found", observations.len());
            let records = records_from_observations(&observations);
            output.write_records(&records).map(|()| ExitCode::Success)
        }
        Err(e) => {
            warn!("Detector {} failed: {e:#}", detector.name());
            let code = if strict_exit {
                ExitCode::Error
            } else {
                ExitCode::Success
            };
            output.write_message(&format!("error: {e:#}")).map(|()| code)
        }
    };

    match written.and_then(|code| output.flush().map(|()| code)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use face_landmarks_core::FaceRecord;
    use face_landmarks_test_support::{
        MockLandmarkDetector, MockResultOutput, ObservationBuilder, SyntheticImageBuilder,
    };

    fn image() -> ImageInfo {
        ImageInfo::new("face.png", SyntheticImageBuilder::uniform_gray(32, 24, 128))
    }

    #[test]
    fn test_validate_input_requires_exactly_one_path() {
        assert!(validate_input(&[]).is_none());
        assert!(validate_input(&[PathBuf::from("a.png"), PathBuf::from("b.png")]).is_none());
        assert_eq!(
            validate_input(&[PathBuf::from("a.jpeg")]).map(|(_, k)| k),
            Some(ImageKind::Jpeg)
        );
    }

    #[test]
    fn test_validate_input_rejects_unsupported_suffix() {
        assert!(validate_input(&[PathBuf::from("a.gif")]).is_none());
        assert!(validate_input(&[PathBuf::from("a.PNG")]).is_none());
        assert!(validate_input(&[PathBuf::from("noext")]).is_none());
    }

    #[test]
    fn test_with_config_enables_flags() {
        let mut config = AppConfig::default();
        config.general.strict_exit = Some(true);
        config.output.pretty = Some(true);

        let args = DetectArgs::with_config(DetectArgs::default(), &config);
        assert!(args.strict_exit);
        assert!(args.pretty);
    }

    #[test]
    fn test_with_config_cannot_disable_cli_flag() {
        let mut config = AppConfig::default();
        config.general.strict_exit = Some(false);
        let args = DetectArgs {
            strict_exit: true,
            ..DetectArgs::default()
        };

        assert!(DetectArgs::with_config(args, &config).strict_exit);
    }

    #[test]
    fn test_zero_faces_writes_empty_batch() {
        let detector = MockLandmarkDetector::empty();
        let output = MockResultOutput::new();

        let code = report(&image(), &detector, &output, false);

        assert_eq!(code, ExitCode::Success);
        assert_eq!(output.batches(), vec![Vec::<FaceRecord>::new()]);
        assert!(output.messages().is_empty());
        assert_eq!(output.flush_count(), 1);
        assert_eq!(detector.call_count(), 1);
    }

    #[test]
    fn test_faces_written_in_detector_order() {
        let detector = MockLandmarkDetector::with_faces(vec![
            ObservationBuilder::new()
                .bbox(0.1, 0.2, 0.3, 0.4)
                .landmark(0.5, 0.25)
                .build(),
            ObservationBuilder::new()
                .bbox(0.6, 0.6, 0.9, 0.9)
                .grid_landmarks(2)
                .build(),
        ]);
        let output = MockResultOutput::new();

        let code = report(&image(), &detector, &output, false);

        assert_eq!(code, ExitCode::Success);
        let batch = &output.batches()[0];
        assert_eq!(batch.len(), 2);
        assert!((batch[0].bbox.top - 0.2).abs() < f32::EPSILON);
        assert!((batch[0].bbox.bottom - 0.4).abs() < f32::EPSILON);
        assert_eq!(batch[0].landmarks, vec![[0.5, 0.75]]);
        assert_eq!(batch[1].landmarks.len(), 4);
    }

    #[test]
    fn test_detector_error_prints_message_and_exits_zero() {
        let detector = MockLandmarkDetector::failing("model not found");
        let output = MockResultOutput::new();

        let code = report(&image(), &detector, &output, false);

        assert_eq!(code, ExitCode::Success);
        assert!(output.batches().is_empty());
        assert_eq!(output.messages(), vec!["error: model not found".to_string()]);
    }

    #[test]
    fn test_detector_error_with_strict_exit() {
        let detector = MockLandmarkDetector::failing("model not found");
        let output = MockResultOutput::new();

        let code = report(&image(), &detector, &output, true);

        assert_eq!(code, ExitCode::Error);
        assert!(output.batches().is_empty());
        assert_eq!(output.messages().len(), 1);
    }
}
