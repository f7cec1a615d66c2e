//! Decoded image and file-type types.

use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageFormat};

/// Image container formats accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// `.jpg` or `.jpeg`
    Jpeg,
    /// `.png`
    Png,
}

impl ImageKind {
    /// Determines the image kind from a path's suffix.
    ///
    /// Matching is an exact, case-sensitive comparison of the end of the path
    /// string against `.jpg`, `.jpeg` and `.png`. `photo.JPG` and `photo` are
    /// both rejected.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref().to_string_lossy();
        if path.ends_with(".jpg") || path.ends_with(".jpeg") {
            Some(Self::Jpeg)
        } else if path.ends_with(".png") {
            Some(Self::Png)
        } else {
            None
        }
    }

    /// The decoder format forced for this kind.
    #[must_use]
    pub const fn format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// A decoded input image.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Path to the image file.
    pub path: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Decoded image data.
    pub image: DynamicImage,
}

impl ImageInfo {
    /// Wraps a decoded image, taking dimensions from the pixel buffer.
    #[must_use]
    pub fn new(path: impl Into<String>, image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            path: path.into(),
            width,
            height,
            image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_supported_suffixes() {
        assert_eq!(ImageKind::from_path("face.jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path("face.jpeg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path("dir/face.png"), Some(ImageKind::Png));
    }

    #[test]
    fn test_kind_is_case_sensitive() {
        assert_eq!(ImageKind::from_path("face.JPG"), None);
        assert_eq!(ImageKind::from_path("face.Png"), None);
    }

    #[test]
    fn test_kind_rejects_other_suffixes() {
        assert_eq!(ImageKind::from_path("face.gif"), None);
        assert_eq!(ImageKind::from_path("face"), None);
        assert_eq!(ImageKind::from_path("face.png.txt"), None);
    }

    #[test]
    fn test_image_info_dimensions() {
        let info = ImageInfo::new("a.png", DynamicImage::new_rgb8(12, 7));
        assert_eq!((info.width, info.height), (12, 7));
        assert_eq!(info.path, "a.png");
    }
}
