//! Progress reporting port for batch annotation.

/// Events emitted while annotating a batch of images.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Annotation started for an image.
    Started {
        /// Path to the image.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total images in batch, if known.
        total: Option<usize>,
    },
    /// An annotation file was written.
    Completed {
        /// Path to the image.
        path: String,
        /// Number of faces found.
        faces: usize,
    },
    /// An image could not be annotated.
    Failed {
        /// Path to the image.
        path: String,
        /// Failure description.
        reason: String,
    },
    /// The batch has finished.
    Finished {
        /// Images annotated successfully.
        processed: usize,
        /// Images that failed.
        failed: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
