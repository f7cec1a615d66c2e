//! Core domain types for face landmark detection.

mod image;
mod observation;
mod record;

pub use image::{ImageInfo, ImageKind};
pub use observation::{FaceObservation, NormalizedPoint, NormalizedRect};
pub use record::{records_from_observations, BoundingBox, FaceRecord, PixelAnnotation, PixelBox};
