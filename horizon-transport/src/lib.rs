//! Frame transport: records what the simulation paints and ships it out.
//!
//! A [`DrawList`] captures one frame's draw calls, a [`FrameEncoder`] turns the
//! resulting [`Frame`] into a single line of text, and a [`FrameSink`] delivers
//! that line somewhere (stdout, a file, or nowhere).

mod draw_list;

pub use draw_list::{DrawCommand, DrawList};

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

// --- Error Type ---
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary encoding failed: {0}")]
    Binary(#[from] bincode::Error),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Everything painted during one animation frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: u64,
    /// Time since the animation started, in milliseconds
    pub elapsed_ms: f64,
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

// --- Traits ---

/// Turns a frame into one newline-free line of text.
pub trait FrameEncoder: Send + Sync {
    fn encode(&self, frame: &Frame) -> Result<String, TransportError>;
}

/// Delivers encoded frames to a destination.
pub trait FrameSink {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

// --- Encoders ---

pub struct JsonEncoder;

impl FrameEncoder for JsonEncoder {
    fn encode(&self, frame: &Frame) -> Result<String, TransportError> {
        Ok(serde_json::to_string(frame)?)
    }
}

/// bincode, wrapped in base64 so each frame stays on a single text line.
pub struct BinaryEncoder;

impl BinaryEncoder {
    pub fn decode(line: &str) -> Result<Frame, TransportError> {
        let bytes = base64::decode(line.trim_end())?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

impl FrameEncoder for BinaryEncoder {
    fn encode(&self, frame: &Frame) -> Result<String, TransportError> {
        let bytes = bincode::serialize(frame)?;
        Ok(base64::encode(bytes))
    }
}

// --- Sinks ---

/// Writes one frame per line to standard output.
pub struct StdioSink {
    stdout: io::Stdout,
}

impl StdioSink {
    pub fn new() -> Self {
        StdioSink { stdout: io::stdout() }
    }
}

impl Default for StdioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for StdioSink {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut out = self.stdout.lock();
        out.write_all(data)?;
        out.write_all(b"\n")?;
        out.flush()?; // consumers read frame by frame
        Ok(())
    }
}

/// Appends one frame per line to a file.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open `path`, truncating it unless `append` is set.
    pub fn open(path: &Path, append: bool) -> Result<Self, TransportError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        Ok(FileSink { writer: BufWriter::new(file) })
    }
}

impl FrameSink for FileSink {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.writer.write_all(data)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Discards every frame. Useful for benchmarking the simulation alone.
#[derive(Default)]
pub struct NullSink {
    sent: u64,
}

impl NullSink {
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl FrameSink for NullSink {
    fn send(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        self.sent += 1;
        Ok(())
    }
}
