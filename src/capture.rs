//! # Frame Capture Module
//!
//! Records every transmitted GDL-90 frame to a JSONL (JSON Lines) file for
//! offline inspection. One JSON object per line:
//!
//! ```text
//! {"timestamp":"2024-05-01T12:00:00.000Z","message_id":0,"message":"Heartbeat","length":11,"hex":"7E 00 81 ..."}
//! ```

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::gdl90::decoder::decode_frame;
use crate::gdl90::protocol::message_name;

/// One captured frame
#[derive(Debug, Serialize)]
pub struct CaptureRecord<'a> {
    pub timestamp: String,
    pub message_id: Option<u8>,
    pub message: &'a str,
    pub length: usize,
    pub hex: String,
}

/// Appends captured frames to a JSONL file
#[derive(Debug)]
pub struct CaptureWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records: u64,
}

impl CaptureWriter {
    /// Open `path` for appending, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            records: 0,
        })
    }

    /// Append one frame
    ///
    /// Frames that fail to decode are still recorded, with no message ID.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails
    pub fn record(&mut self, frame: &[u8]) -> Result<()> {
        let message_id = decode_frame(frame).ok().map(|decoded| decoded.message_id);

        let record = CaptureRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message_id,
            message: message_id.map_or("Invalid", message_name),
            length: frame.len(),
            hex: format_hex(frame),
        };

        serde_json::to_writer(&mut self.writer, &record)
            .map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.records += 1;
        Ok(())
    }

    /// Number of frames written since opening
    pub fn records(&self) -> u64 {
        self.records
    }

    /// File the frames are appended to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Format bytes as space-separated upper-case hex
///
/// # Examples
///
/// ```
/// use gdl90_bridge::capture::format_hex;
///
/// assert_eq!(format_hex(&[0x7E, 0x00, 0x81]), "7E 00 81");
/// ```
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
