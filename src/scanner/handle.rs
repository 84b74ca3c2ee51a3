//! Lazily opened, exactly-once-closed file handle.
//!
//! # Overview
//!
//! A [`FileHandle`] wraps the byte stream of one discovered file. The file is
//! not opened until the first [`read_byte`](FileHandle::read_byte), and
//! [`close`](FileHandle::close) is the single finalize path every
//! classification (unique, duplicate, failed, abort) goes through. Only the
//! first call to `close` releases the OS handle; later calls are no-ops.
//!
//! ```text
//! Unopened ──read_byte──▶ Open ──close──▶ Closed
//!     └──────────────close──────────────────▲
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of reading one byte from a [`FileHandle`].
#[derive(Debug)]
pub enum ByteRead {
    /// The next byte of the file.
    Byte(u8),
    /// The stream has no more bytes.
    EndOfStream,
    /// Opening or reading the file failed.
    Failed(io::Error),
}

/// Lifecycle state of a [`FileHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Discovered but never read.
    Unopened,
    /// Stream is open and positioned after the last byte read.
    Open,
    /// Stream has been released; no further reads are possible.
    Closed,
}

enum Stream {
    Unopened,
    Open(BufReader<File>),
    Closed,
}

/// Wrapper around a single file's byte stream used during comparison.
///
/// A handle is read by one task at a time; the internal lock is never
/// contended and only exists so that handles can be shared through
/// [`Arc`](std::sync::Arc)-based group sequences.
pub struct FileHandle {
    path: PathBuf,
    length: u64,
    stream: Mutex<Stream>,
}

impl FileHandle {
    /// Create an unopened handle for `path` with its discovered `length`.
    #[must_use]
    pub fn new(path: PathBuf, length: u64) -> Self {
        Self {
            path,
            length,
            stream: Mutex::new(Stream::Unopened),
        }
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File length observed when the file was discovered.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.length
    }

    fn lock(&self) -> MutexGuard<'_, Stream> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HandleState {
        match *self.lock() {
            Stream::Unopened => HandleState::Unopened,
            Stream::Open(_) => HandleState::Open,
            Stream::Closed => HandleState::Closed,
        }
    }

    /// Check if the handle has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == HandleState::Closed
    }

    /// Read exactly one more byte, opening the file on first use.
    ///
    /// Reading a closed handle reports a failure rather than reopening it.
    pub fn read_byte(&self) -> ByteRead {
        let mut stream = self.lock();

        if let Stream::Unopened = *stream {
            match File::open(&self.path) {
                Ok(file) => {
                    log::trace!("Opened {}", self.path.display());
                    *stream = Stream::Open(BufReader::new(file));
                }
                Err(e) => return ByteRead::Failed(e),
            }
        }

        let reader = match &mut *stream {
            Stream::Open(reader) => reader,
            _ => return ByteRead::Failed(io::Error::other("read from closed file handle")),
        };

        let mut byte = [0u8; 1];
        loop {
            match reader.read(&mut byte) {
                Ok(0) => return ByteRead::EndOfStream,
                Ok(_) => return ByteRead::Byte(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return ByteRead::Failed(e),
            }
        }
    }

    /// Release the stream.
    ///
    /// Returns `true` if this call performed the transition to
    /// [`HandleState::Closed`], `false` if the handle was already closed.
    pub fn close(&self) -> bool {
        let mut stream = self.lock();
        match std::mem::replace(&mut *stream, Stream::Closed) {
            Stream::Closed => false,
            Stream::Open(reader) => {
                drop(reader);
                log::trace!("Closed {}", self.path.display());
                true
            }
            Stream::Unopened => true,
        }
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("length", &self.length)
            .field("state", &self.state())
            .finish()
    }
}
