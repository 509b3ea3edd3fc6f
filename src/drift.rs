//! Drift detection between two rendered diagrams
//!
//! Equality is exact: no whitespace or line-ending normalization. Files are
//! compared by length first, then streamed in fixed-size chunks.

use crate::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Chunk size used when streaming files
pub const CHUNK_SIZE: usize = 64 * 1024;

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => Error::io(path, e),
    })
}

fn file_len(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(path.to_path_buf())),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Fill `buf` as far as the reader allows, returning the bytes read.
fn read_chunk(reader: &mut impl Read, buf: &mut [u8], path: &Path) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(path, e)),
        }
    }
    Ok(filled)
}

/// Check whether two files hold exactly the same bytes.
///
/// Either file missing yields `Error::NotFound`.
pub fn files_equal(a: &Path, b: &Path) -> Result<bool> {
    let (len_a, len_b) = (file_len(a)?, file_len(b)?);
    if len_a != len_b {
        return Ok(false);
    }

    let mut reader_a = BufReader::with_capacity(CHUNK_SIZE, open(a)?);
    let mut reader_b = BufReader::with_capacity(CHUNK_SIZE, open(b)?);
    let mut buf_a = vec![0u8; CHUNK_SIZE];
    let mut buf_b = vec![0u8; CHUNK_SIZE];

    loop {
        let n_a = read_chunk(&mut reader_a, &mut buf_a, a)?;
        let n_b = read_chunk(&mut reader_b, &mut buf_b, b)?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// BLAKE3 digest of a file, hex encoded.
pub fn digest(path: &Path) -> Result<String> {
    let mut reader = open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = read_chunk(&mut reader, &mut buf, path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Result of comparing an old and a new diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub old: PathBuf,
    pub new: PathBuf,
    pub identical: bool,
    /// Digests of both files, only computed when they differ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_digest: Option<String>,
}

impl DriftReport {
    pub fn compare(old: &Path, new: &Path) -> Result<Self> {
        let identical = files_equal(old, new)?;
        let (old_digest, new_digest) = if identical {
            (None, None)
        } else {
            (Some(digest(old)?), Some(digest(new)?))
        };
        tracing::debug!(old = %old.display(), new = %new.display(), identical, "compared diagrams");
        Ok(Self {
            old: old.to_path_buf(),
            new: new.to_path_buf(),
            identical,
            old_digest,
            new_digest,
        })
    }

    pub fn has_drift(&self) -> bool {
        !self.identical
    }
}
