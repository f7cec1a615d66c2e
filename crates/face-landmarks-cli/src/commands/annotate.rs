//! Annotate command - write one landmark file per image in a tree.

use std::fs::File;
use std::io::{BufWriter, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use face_landmarks_adapters::FsImageSource;
use face_landmarks_core::{
    records_from_observations, CandleLandmarkDetector, ImageInfo, ImageSource, LandmarkDetector,
    PixelAnnotation, ProgressEvent, ProgressSink, ResultOutput,
};
use tracing::{debug, info};

use super::{detector_config, ExitCode};
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Arguments for the annotate command.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnnotateArgs {
    /// Image files or directories to annotate
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Directory the annotation files are written into
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Write integer pixel coordinates instead of normalized ones
    #[arg(long)]
    pub pixels: bool,

    /// Keep annotating after a failed image
    #[arg(long)]
    pub keep_going: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Counts for one annotate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotateSummary {
    /// Images whose annotation file was written.
    pub processed: usize,
    /// Images that failed to decode or detect.
    pub failed: usize,
}

impl AnnotateSummary {
    /// Exit status for the run.
    #[must_use]
    pub const fn exit_code(self) -> ExitCode {
        if self.failed > 0 {
            ExitCode::Error
        } else {
            ExitCode::Success
        }
    }
}

/// Run the annotate command.
pub fn run(args: &AnnotateArgs, config: &AppConfig, force_cpu: bool) -> Result<ExitCode> {
    info!(
        "Annotating {} input(s) into {}",
        args.inputs.len(),
        args.output.display()
    );

    let source = FsImageSource::new(args.inputs.clone(), args.recursive);
    let total = source.count_hint();
    let show_bar = std::io::stderr().is_terminal();
    let progress = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_bar);
    let detector = CandleLandmarkDetector::new(detector_config(config, force_cpu));

    let summary = annotate_all(&source, &detector, &progress, args)?;
    Ok(summary.exit_code())
}

/// Annotates every image in `source`.
///
/// # Errors
///
/// Without `keep_going`, the first failed image is returned as the error.
pub fn annotate_all(
    source: &FsImageSource,
    detector: &dyn LandmarkDetector,
    progress: &dyn ProgressSink,
    args: &AnnotateArgs,
) -> Result<AnnotateSummary> {
    let total = source.count_hint();
    let mut summary = AnnotateSummary {
        processed: 0,
        failed: 0,
    };

    for (index, entry) in source.images().enumerate() {
        let path = entry.path.display().to_string();
        progress.on_event(ProgressEvent::Started {
            path: path.clone(),
            index,
            total,
        });

        match entry
            .image
            .and_then(|image| annotate_one(&image, source, detector, args))
        {
            Ok(faces) => {
                summary.processed += 1;
                progress.on_event(ProgressEvent::Completed { path, faces });
            }
            Err(e) => {
                summary.failed += 1;
                progress.on_event(ProgressEvent::Failed {
                    path,
                    reason: format!("{e:#}"),
                });
                if !args.keep_going {
                    return Err(e);
                }
            }
        }
    }

    progress.on_event(ProgressEvent::Finished {
        processed: summary.processed,
        failed: summary.failed,
    });

    Ok(summary)
}

/// Detects landmarks in one image and writes its annotation file.
fn annotate_one(
    image: &ImageInfo,
    source: &FsImageSource,
    detector: &dyn LandmarkDetector,
    args: &AnnotateArgs,
) -> Result<usize> {
    let observations = detector
        .detect(&image.image)
        .with_context(|| format!("Detection failed for {}", image.path))?;
    let records = records_from_observations(&observations);

    let target = args
        .output
        .join(source.relative_path(Path::new(&image.path)))
        .with_extension("json");
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file =
        File::create(&target).with_context(|| format!("Failed to create {}", target.display()))?;
    let output = JsonOutput::new(Box::new(BufWriter::new(file)), false);

    if args.pixels {
        let pixels: Vec<PixelAnnotation> = records
            .iter()
            .map(|r| r.to_pixels(image.width, image.height))
            .collect();
        output.write_json(&pixels)?;
    } else {
        output.write_json(&records)?;
    }
    output
        .flush()
        .with_context(|| format!("Failed to write {}", target.display()))?;

    debug!("Wrote {} ({} faces)", target.display(), records.len());
    Ok(records.len())
}
