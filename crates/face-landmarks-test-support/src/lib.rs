//! Test support utilities for face-landmarks.
//!
//! Provides mocks, synthetic image builders, and observation builders for
//! testing the detection and reporting flow without model weights.
//!
//! # Example
//!
//! ```
//! use face_landmarks_test_support::{MockLandmarkDetector, ObservationBuilder};
//!
//! let face = ObservationBuilder::new().bbox(0.2, 0.1, 0.6, 0.7).grid_landmarks(3).build();
//! let detector = MockLandmarkDetector::with_faces(vec![face]);
//! ```

mod builders;
mod mocks;

pub use builders::{ObservationBuilder, SyntheticImageBuilder};
pub use mocks::{MockLandmarkDetector, MockProgressSink, MockResultOutput, SharedBuffer};
