//! Port yielding the photos a batch annotation walks over.

use std::path::PathBuf;

use crate::domain::ImageInfo;

/// One photo from an [`ImageSource`]: the file it names and how loading went.
#[derive(Debug)]
pub struct SourcedImage {
    /// File the photo was read from.
    pub path: PathBuf,
    /// The decoded photo, or why it could not be read or decoded.
    pub image: anyhow::Result<ImageInfo>,
}

/// Supplies photos for landmark annotation in a stable order.
pub trait ImageSource: Send + Sync {
    /// Yields every photo in order. A file that fails to load still yields
    /// an entry, so callers can report it by path.
    fn images(&self) -> Box<dyn Iterator<Item = SourcedImage> + Send + '_>;

    /// Number of entries `images` yields, if known up front.
    fn count_hint(&self) -> Option<usize>;
}
