//! Write-if-changed file writer
//!
//! Content is first written to a uniquely named sibling temp file. When the
//! target already holds the same bytes the temp file is dropped and the
//! target is left alone (mtime included); otherwise the temp file is renamed
//! over the target, so readers only ever see the old or the new content.

use crate::drift::files_equal;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// What `write_if_changed` did to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Unchanged,
    Written,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Unchanged => "unchanged",
            WriteOutcome::Written => "wrote",
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written)
    }
}

/// Write `content` to `path` unless the file already holds exactly those
/// bytes.
///
/// The temp file is removed on every exit path: `NamedTempFile` deletes
/// itself on drop, including when a failed `persist` hands it back.
pub fn write_if_changed(path: &Path, content: &str) -> Result<WriteOutcome> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    std::fs::create_dir_all(&parent).map_err(|e| Error::io(&parent, e))?;

    let mut temp = new_temp_in(&parent)?;
    temp.write_all(content.as_bytes())
        .and_then(|_| temp.flush())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| Error::io(temp.path(), e))?;

    if path.exists() && files_equal(path, temp.path())? {
        tracing::debug!(path = %path.display(), "content unchanged, leaving target untouched");
        return Ok(WriteOutcome::Unchanged);
    }

    if path.exists() {
        let permissions = std::fs::metadata(path).map_err(|e| Error::io(path, e))?.permissions();
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| Error::io(temp.path(), e))?;
    }
    temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "target replaced");
    Ok(WriteOutcome::Written)
}

/// Temp file created with the mode a plain `File::create` would get, so a
/// new target is not left owner-only.
fn new_temp_in(dir: &Path) -> Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir).map_err(|e| Error::io(dir, e))
}
