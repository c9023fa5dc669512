//! Execution log for hook scripts.
//!
//! A [`FileLogger`] persists everything a script run produces to a log file
//! (or discards it when no file is configured) and can mirror each flushed
//! chunk of output to a [`MirrorHandler`], e.g. the console.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Platform line terminator used for every logged line.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// Platform line terminator used for every logged line.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Destination for the transcript of a script run.
pub trait ExecutionLogger {
    /// The stream scripts write their output to.
    fn print_stream(&mut self) -> &mut dyn Write;

    /// Write a single line and flush it.
    fn consume_line(&mut self, line: &str) -> io::Result<()>;
}

/// Receives output mirrored from a [`FileLogger`].
pub trait MirrorHandler {
    /// Called once per flush with the text written since the previous flush,
    /// without trailing line terminators.
    fn consume_output(&mut self, message: &str);
}

impl<F: FnMut(&str)> MirrorHandler for F {
    fn consume_output(&mut self, message: &str) {
        self(message)
    }
}

/// Logger writing to a file, or discarding output when no file is given.
pub struct FileLogger {
    file: Option<PathBuf>,
    stream: LogStream,
}

impl FileLogger {
    /// Create a logger writing to `output_file`.
    ///
    /// Parent directories are created as needed. With `None` all output is
    /// discarded.
    pub fn new(output_file: Option<&Path>) -> io::Result<Self> {
        Self::create(output_file, None)
    }

    /// Create a logger that also mirrors flushed output to `handler`.
    pub fn with_mirror<H>(output_file: Option<&Path>, handler: H) -> io::Result<Self>
    where
        H: MirrorHandler + 'static,
    {
        Self::create(output_file, Some(Box::new(handler)))
    }

    fn create(
        output_file: Option<&Path>,
        mirror: Option<Box<dyn MirrorHandler>>,
    ) -> io::Result<Self> {
        let out: Box<dyn Write> = match output_file {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                Box::new(BufWriter::new(File::create(path)?))
            }
            None => Box::new(io::sink()),
        };

        Ok(Self {
            file: output_file.map(Path::to_path_buf),
            stream: LogStream {
                out,
                mirror,
                line_buffer: Vec::new(),
            },
        })
    }

    /// Path of the log file, `None` when output is discarded.
    pub fn output_file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Flush pending output and release the log file.
    pub fn close(mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl ExecutionLogger for FileLogger {
    fn print_stream(&mut self) -> &mut dyn Write {
        &mut self.stream
    }

    fn consume_line(&mut self, line: &str) -> io::Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(LINE_SEPARATOR.as_bytes())?;
        self.stream.flush()
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        let _ = self.stream.flush();
    }
}

/// Underlying stream of a [`FileLogger`].
///
/// Bytes go straight to the backing writer; with a mirror attached they are
/// also buffered until the next flush.
struct LogStream {
    out: Box<dyn Write>,
    mirror: Option<Box<dyn MirrorHandler>>,
    line_buffer: Vec<u8>,
}

impl Write for LogStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.out.write(buf)?;
        if self.mirror.is_some() {
            self.line_buffer.extend_from_slice(&buf[..written]);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;

        let Some(mirror) = self.mirror.as_mut() else {
            return Ok(());
        };
        if self.line_buffer.is_empty() {
            return Ok(());
        }

        while matches!(self.line_buffer.last(), Some(b'\n' | b'\r')) {
            self.line_buffer.pop();
        }
        mirror.consume_output(&String::from_utf8_lossy(&self.line_buffer));
        self.line_buffer.clear();

        Ok(())
    }
}
