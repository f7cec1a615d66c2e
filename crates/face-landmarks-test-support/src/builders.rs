//! Synthetic images and observations for tests.

use face_landmarks_core::domain::{FaceObservation, NormalizedPoint, NormalizedRect};
use image::{DynamicImage, GrayImage, Luma, RgbImage};

/// Builder for synthetic test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// A uniform gray image.
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
    }

    /// A uniform RGB image.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([r, g, b])))
    }

    /// A black-and-white checkerboard with `cell` pixel squares.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell: u32) -> DynamicImage {
        let cell = cell.max(1);
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }
}

/// Builder for detector observations.
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    bounding_box: NormalizedRect,
    confidence: f32,
    landmarks: Vec<NormalizedPoint>,
}

impl Default for ObservationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationBuilder {
    /// Starts from a centered box with no landmarks.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bounding_box: NormalizedRect::new(0.25, 0.25, 0.75, 0.75),
            confidence: 0.9,
            landmarks: Vec::new(),
        }
    }

    /// Sets the bounding box edges.
    #[must_use]
    pub fn bbox(mut self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        self.bounding_box = NormalizedRect::new(min_x, min_y, max_x, max_y);
        self
    }

    /// Sets the confidence.
    #[must_use]
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Appends one landmark.
    #[must_use]
    pub fn landmark(mut self, x: f32, y: f32) -> Self {
        self.landmarks.push(NormalizedPoint::new(x, y));
        self
    }

    /// Replaces the landmarks with an `n` x `n` grid spanning the box.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn grid_landmarks(mut self, n: usize) -> Self {
        let step = if n > 1 { 1.0 / (n - 1) as f32 } else { 0.0 };
        self.landmarks = (0..n)
            .flat_map(|row| {
                (0..n).map(move |col| NormalizedPoint::new(col as f32 * step, row as f32 * step))
            })
            .collect();
        self
    }

    /// Builds the observation.
    #[must_use]
    pub fn build(self) -> FaceObservation {
        FaceObservation {
            bounding_box: self.bounding_box,
            confidence: self.confidence,
            landmarks: self.landmarks,
        }
    }
}
