//! Result output port for writing detection results.

use crate::domain::FaceRecord;

/// Port for emitting detection results and user-facing messages.
pub trait ResultOutput: Send + Sync {
    /// Writes the records for one image as a single JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    fn write_records(&self, records: &[FaceRecord]) -> anyhow::Result<()>;

    /// Writes a plain text line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_message(&self, message: &str) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
