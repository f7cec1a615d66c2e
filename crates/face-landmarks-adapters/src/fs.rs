//! Filesystem adapter for loading images.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use face_landmarks_core::{ImageInfo, ImageKind, ImageSource, SourcedImage};
use tracing::{debug, warn};

/// Reads and decodes an image, forcing the decoder selected by `kind`.
///
/// A `.png` path holding JPEG bytes fails here rather than being sniffed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its bytes do not decode as
/// `kind`.
pub fn load_image(path: &Path, kind: ImageKind) -> Result<ImageInfo> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image: {}", path.display()))?;

    let image = image::load_from_memory_with_format(&bytes, kind.format())
        .with_context(|| format!("Failed to decode {kind:?} image: {}", path.display()))?;

    debug!(
        "Decoded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );

    Ok(ImageInfo::new(path.to_string_lossy(), image))
}

/// Filesystem image source over files and directories.
pub struct FsImageSource {
    roots: Vec<PathBuf>,
    recursive: bool,
}

impl FsImageSource {
    /// Creates a new filesystem image source.
    ///
    /// # Arguments
    ///
    /// * `roots` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(roots: Vec<PathBuf>, recursive: bool) -> Self {
        Self { roots, recursive }
    }

    /// Collects all files with a supported suffix, sorted per root.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for root in &self.roots {
            if root.is_file() {
                if ImageKind::from_path(root).is_some() {
                    files.push(root.clone());
                } else {
                    warn!("Unsupported file type: {}", root.display());
                }
            } else if root.is_dir() {
                let start = files.len();
                self.collect_from_dir(root, &mut files);
                files[start..].sort();
            } else {
                warn!("Path does not exist: {}", root.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && ImageKind::from_path(&path).is_some() {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }

    /// Path of `file` relative to the input root it was found under.
    ///
    /// Files given directly as roots map to their file name.
    #[must_use]
    pub fn relative_path(&self, file: &Path) -> PathBuf {
        self.roots
            .iter()
            .filter(|root| root.is_dir())
            .filter_map(|root| file.strip_prefix(root).ok())
            .min_by_key(|rel| rel.components().count())
            .map_or_else(
                || file.file_name().map_or_else(|| file.to_path_buf(), PathBuf::from),
                Path::to_path_buf,
            )
    }
}

impl ImageSource for FsImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = SourcedImage> + Send + '_> {
        let files = self.files();
        debug!("Found {} image files", files.len());

        Box::new(files.into_iter().map(|path| {
            let image = ImageKind::from_path(&path)
                .with_context(|| format!("Unsupported image suffix: {}", path.display()))
                .and_then(|kind| load_image(&path, kind));
            SourcedImage { path, image }
        }))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.files().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_for_file_root() {
        let source = FsImageSource::new(vec![PathBuf::from("/data/face.png")], false);
        assert_eq!(
            source.relative_path(Path::new("/data/face.png")),
            PathBuf::from("face.png")
        );
    }

    #[test]
    fn test_load_image_missing_file() {
        let err = load_image(Path::new("/nonexistent/face.png"), ImageKind::Png)
            .err()
            .map(|e| e.to_string());
        assert!(err.is_some_and(|e| e.contains("Failed to read image")));
    }
}
