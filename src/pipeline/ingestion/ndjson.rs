use crate::error::{PipelineError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Size and content hash of a source file, recorded per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

impl SourceFingerprint {
    /// Fingerprint an in-memory copy of a whole file.
    pub fn of_bytes(path: &Path, data: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            bytes: data.len() as u64,
            sha256: hex::encode(Sha256::digest(data)),
        }
    }
}

/// Line-at-a-time reader for newline-delimited JSON exports.
///
/// Lines are handed out as raw bytes from a reused buffer so that invalid
/// UTF-8 surfaces as a per-line parse failure instead of an I/O error.
/// Every byte read is fed into a running SHA-256.
pub struct NdjsonReader<R> {
    path: PathBuf,
    reader: BufReader<R>,
    buf: Vec<u8>,
    line_no: u64,
    bytes_read: u64,
    hasher: Sha256,
}

impl NdjsonReader<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PipelineError::from_open(path, e))?;
        Ok(Self::new(path, file))
    }
}

impl<R: Read> NdjsonReader<R> {
    pub fn new(path: &Path, inner: R) -> Self {
        Self {
            path: path.to_path_buf(),
            reader: BufReader::new(inner),
            buf: Vec::with_capacity(8 * 1024),
            line_no: 0,
            bytes_read: 0,
            hasher: Sha256::new(),
        }
    }

    /// Read the next line, without its trailing newline. Returns `None` at EOF.
    pub fn next_line(&mut self) -> Result<Option<(u64, &[u8])>> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }
        self.bytes_read += read as u64;
        self.hasher.update(&self.buf);
        self.line_no += 1;

        let mut line: &[u8] = &self.buf;
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
        }
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        Ok(Some((self.line_no, line)))
    }

    /// Consume the reader and produce the fingerprint of everything read.
    pub fn finish(self) -> SourceFingerprint {
        SourceFingerprint {
            path: self.path,
            bytes: self.bytes_read,
            sha256: hex::encode(self.hasher.finalize()),
        }
    }
}

/// True when a line holds nothing but whitespace.
pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|b| b.is_ascii_whitespace())
}
