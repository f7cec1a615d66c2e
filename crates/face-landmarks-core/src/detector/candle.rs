//! On-device face landmark detection.
//!
//! Two stages:
//! - `BlazeFace` finds face boxes
//! - the landmark regressor places 68 points inside each box

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::debug;

use crate::domain::FaceObservation;
use crate::inference::{select_device, BlazeFace, FaceDetection, LandmarkRegressor, LazyModel};
use crate::ports::LandmarkDetector;

/// Configuration for [`CandleLandmarkDetector`].
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum `BlazeFace` anchor score kept before suppression.
    pub score_threshold: f32,
    /// IoU at or above which overlapping boxes are suppressed.
    pub nms_threshold: f32,
    /// Faces below this confidence are not reported.
    pub min_face_confidence: f32,
    /// Fraction of the face box added around it before landmark regression.
    pub crop_padding: f32,
    /// Run on CPU even if a GPU backend is available.
    pub force_cpu: bool,
    /// Path to `BlazeFace` weights.
    pub blazeface_model_path: PathBuf,
    /// Path to landmark regressor weights.
    pub landmarks_model_path: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.75,
            nms_threshold: 0.3,
            min_face_confidence: 0.75,
            crop_padding: 0.2,
            force_cpu: false,
            blazeface_model_path: PathBuf::from("blazeface.safetensors"),
            landmarks_model_path: PathBuf::from("landmarks68.safetensors"),
        }
    }
}

impl DetectorConfig {
    /// Sets both model paths.
    #[must_use]
    pub fn with_model_paths(
        mut self,
        blazeface: impl Into<PathBuf>,
        landmarks: impl Into<PathBuf>,
    ) -> Self {
        self.blazeface_model_path = blazeface.into();
        self.landmarks_model_path = landmarks.into();
        self
    }
}

/// Face landmark detector running `BlazeFace` and the landmark regressor
/// through candle.
///
/// Weights are loaded on the first call to [`LandmarkDetector::detect`].
pub struct CandleLandmarkDetector {
    config: DetectorConfig,
    blazeface: LazyModel<BlazeFace>,
    landmarks: LazyModel<LandmarkRegressor>,
}

impl CandleLandmarkDetector {
    /// Creates a detector. No model files are touched yet.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        let device = select_device(config.force_cpu);
        Self {
            blazeface: LazyModel::new(
                "blazeface",
                &config.blazeface_model_path,
                device.clone(),
                BlazeFace::new,
            ),
            landmarks: LazyModel::new(
                "landmarks68",
                &config.landmarks_model_path,
                device,
                LandmarkRegressor::new,
            ),
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl LandmarkDetector for CandleLandmarkDetector {
    fn name(&self) -> &'static str {
        "candle"
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceObservation>> {
        let blazeface = self.blazeface.get()?;
        let regressor = self.landmarks.get()?;
        self.run_stages(blazeface, regressor, image)
    }
}

impl CandleLandmarkDetector {
    fn run_stages(
        &self,
        blazeface: &BlazeFace,
        regressor: &LandmarkRegressor,
        image: &DynamicImage,
    ) -> Result<Vec<FaceObservation>> {
        let detections = blazeface
            .detect(
                image,
                self.config.score_threshold,
                self.config.nms_threshold,
            )
            .context("Face detection failed")?;
        debug!("BlazeFace found {} candidate faces", detections.len());

        let faces = reportable(detections, self.config.min_face_confidence);
        let mut observations = Vec::with_capacity(faces.len());
        for det in faces {
            let landmarks = regressor
                .predict(image, &det.bbox, self.config.crop_padding)
                .context("Landmark regression failed")?;

            observations.push(FaceObservation {
                bounding_box: det.bbox,
                confidence: det.score,
                landmarks,
            });
        }

        debug!("Reporting {} faces", observations.len());
        Ok(observations)
    }
}

/// Drops detections below `min_confidence` and those with an empty box.
fn reportable(detections: Vec<FaceDetection>, min_confidence: f32) -> Vec<FaceDetection> {
    detections
        .into_iter()
        .filter(|det| {
            if det.score < min_confidence {
                debug!("Skipping low-confidence face: {:.2}", det.score);
                return false;
            }
            if det.bbox.width() <= 0.0 || det.bbox.height() <= 0.0 {
                debug!("Skipping empty face box: {:?}", det.bbox);
                return false;
            }
            true
        })
        .collect()
}
