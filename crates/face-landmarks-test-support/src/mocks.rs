//! Mock implementations of core port traits.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use face_landmarks_core::domain::{FaceObservation, FaceRecord};
use face_landmarks_core::ports::{LandmarkDetector, ProgressEvent, ProgressSink, ResultOutput};
use image::DynamicImage;

/// Mock implementation of `LandmarkDetector` for testing.
///
/// Returns a fixed set of observations, or fails with a fixed message, and
/// counts calls for assertions.
pub struct MockLandmarkDetector {
    outcome: Result<Vec<FaceObservation>, String>,
    calls: Arc<Mutex<usize>>,
}

impl MockLandmarkDetector {
    /// A detector that reports the given faces.
    #[must_use]
    pub fn with_faces(faces: Vec<FaceObservation>) -> Self {
        Self {
            outcome: Ok(faces),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A detector that finds nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_faces(Vec::new())
    }

    /// A detector that always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns how many times `detect` was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LandmarkDetector for MockLandmarkDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<FaceObservation>> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.outcome
            .clone()
            .map_err(|message| anyhow::anyhow!(message))
    }
}

/// An in-memory writer whose contents can be read back after being handed
/// out as a `Box<dyn Write + Send>`.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap_or_else(PoisonError::into_inner))
            .into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures record batches and messages for later assertions.
pub struct MockResultOutput {
    batches: Arc<Mutex<Vec<Vec<FaceRecord>>>>,
    messages: Arc<Mutex<Vec<String>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
            messages: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns every batch passed to `write_records`.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<FaceRecord>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns every message passed to `write_message`.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write_records(&self, records: &[FaceRecord]) -> anyhow::Result<()> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(records.to_vec());
        Ok(())
    }

    fn write_message(&self, message: &str) -> anyhow::Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns the number of `Failed` events.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Failed { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { processed, failed } => Some((*processed, *failed)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
