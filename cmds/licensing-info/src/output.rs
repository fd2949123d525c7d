//! Rendering of the licensing snapshot to standard output.

use std::io::{self, ErrorKind, Write};

use serde::Serialize;
use thiserror::Error;

/// The value could not be encoded as JSON.
#[derive(Debug, Error)]
#[error("failed to encode value as JSON")]
pub struct SerializationError(#[from] serde_json::Error);

/// The rendered output could not be written.
#[derive(Debug, Error)]
#[error("failed to write output")]
pub struct OutputError(#[from] io::Error);

/// Encode `value` as compact JSON, without a trailing newline.
pub fn render<T: Serialize>(value: &T) -> Result<String, SerializationError> {
	Ok(serde_json::to_string(value)?)
}

/// Write an already rendered document in one go.
pub fn emit<W: Write>(rendered: &str, mut writer: W) -> Result<(), OutputError> {
	writer.write_all(rendered.as_bytes())?;
	writer.flush()?;
	Ok(())
}

/// Standard output wrapper for `licensing-info | head -c 10`: once the reader
/// has gone away, the remaining bytes are dropped and the run still succeeds.
pub struct BrokenPipeGuard<W>(W);

impl<W> BrokenPipeGuard<W> {
	pub fn new(stdout: W) -> Self {
		Self(stdout)
	}
}

fn reader_gone<T>(result: io::Result<T>, dropped: T) -> io::Result<T> {
	match result {
		Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(dropped),
		result => result,
	}
}

impl<W: Write> Write for BrokenPipeGuard<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		reader_gone(self.0.write(buf), buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		reader_gone(self.0.flush(), ())
	}
}
