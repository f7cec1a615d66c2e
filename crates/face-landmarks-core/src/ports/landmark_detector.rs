//! Face landmark detection port.

use image::DynamicImage;

use crate::domain::FaceObservation;

/// Port for a face-and-landmarks detection capability.
///
/// Implementations block until detection has finished.
pub trait LandmarkDetector: Send + Sync {
    /// Returns the name of this detector backend.
    fn name(&self) -> &'static str;

    /// Detects faces and their landmark points in an image.
    ///
    /// Observations are returned in the detector's own order; an empty vector
    /// means no faces were found.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector cannot run (missing models, inference
    /// failure). The error message is shown to the user.
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<FaceObservation>>;
}
