//! ML inference using Candle.
//!
//! Provides model loading and inference for:
//! - `BlazeFace` face detection
//! - 68-point facial landmark regression on face crops

mod blazeface;
mod device;
mod landmarks;
mod loader;
mod utils;

pub use blazeface::{BlazeFace, FaceDetection, INPUT_SIZE};
pub use device::select_device;
pub use landmarks::{LandmarkRegressor, CROP_SIZE, NUM_LANDMARKS};
pub use loader::{load_safetensors, LazyModel};
pub(crate) use utils::{clamp_unit, sigmoid};
