//! `LandmarkDetector` implementations.

mod candle;

pub use self::candle::{CandleLandmarkDetector, DetectorConfig};
