//! Face Landmarks Core - Domain types, ports and inference.
//!
//! This crate contains the face observation and result record types, the
//! `LandmarkDetector` port, and a candle-backed detector built from `BlazeFace`
//! and a 68-point landmark regressor.

pub mod detector;
pub mod domain;
pub mod inference;
pub mod ports;

pub use detector::{CandleLandmarkDetector, DetectorConfig};
pub use domain::{
    records_from_observations, BoundingBox, FaceObservation, FaceRecord, ImageInfo, ImageKind,
    NormalizedPoint, NormalizedRect, PixelAnnotation, PixelBox,
};
pub use ports::{
    ImageSource, LandmarkDetector, ProgressEvent, ProgressSink, ResultOutput, SourcedImage,
};
