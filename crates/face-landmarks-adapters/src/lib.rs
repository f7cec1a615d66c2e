//! Face Landmarks Adapters - External adapters for face-landmarks.
//!
//! This crate provides adapters for:
//! - Loading images from the filesystem by suffix
//! - Model downloading and caching

pub mod fs;
pub mod models;

pub use fs::{load_image, FsImageSource};
pub use models::{model_path, models_dir, set_models_dir};
