//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod image_source;
mod landmark_detector;
mod progress;
mod result_output;

pub use image_source::{ImageSource, SourcedImage};
pub use landmark_detector::LandmarkDetector;
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
