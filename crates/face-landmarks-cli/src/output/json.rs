//! JSON output adapter.

use anyhow::Result;
use face_landmarks_core::{FaceRecord, ResultOutput};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes one JSON document per call, followed by a newline.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    pretty: bool,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout(pretty: bool) -> Self {
        Self::new(Box::new(io::stdout()), pretty)
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            pretty,
        }
    }

    /// Serializes any value on a single line, or indented when pretty.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ResultOutput for JsonOutput {
    fn write_records(&self, records: &[FaceRecord]) -> Result<()> {
        self.write_json(records)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_message(&self, message: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{message}")?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use face_landmarks_core::BoundingBox;
    use face_landmarks_test_support::SharedBuffer;

    fn record() -> FaceRecord {
        FaceRecord {
            bbox: BoundingBox {
                left: 0.25,
                top: 0.25,
                right: 0.75,
                bottom: 0.75,
            },
            landmarks: vec![[0.5, 0.5]],
        }
    }

    #[test]
    fn test_empty_records_print_empty_array() {
        let buffer = SharedBuffer::new();
        let output = JsonOutput::new(Box::new(buffer.clone()), false);

        output.write_records(&[]).unwrap();
        output.flush().unwrap();

        assert_eq!(buffer.contents(), "[]\n");
    }

    #[test]
    fn test_compact_output_is_one_line() {
        let buffer = SharedBuffer::new();
        let output = JsonOutput::new(Box::new(buffer.clone()), false);

        output.write_records(&[record(), record()]).unwrap();

        let text = buffer.contents();
        assert_eq!(text.lines().count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["bbox"]["left"], 0.25);
        assert_eq!(parsed[0]["landmarks"][0][1], 0.5);
    }

    #[test]
    fn test_pretty_output_parses_the_same() {
        let buffer = SharedBuffer::new();
        let output = JsonOutput::new(Box::new(buffer.clone()), true);

        output.write_records(&[record()]).unwrap();

        let text = buffer.contents();
        assert!(text.lines().count() > 1);
        let parsed: Vec<FaceRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, vec![record()]);
    }

    #[test]
    fn test_message_written_verbatim() {
        let buffer = SharedBuffer::new();
        let output = JsonOutput::new(Box::new(buffer.clone()), true);

        output.write_message("error: boom").unwrap();

        assert_eq!(buffer.contents(), "error: boom\n");
    }
}
