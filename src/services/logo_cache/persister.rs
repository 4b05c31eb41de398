//! Atomic file replacement for cached assets and schedule documents
//!
//! Content is written to a hidden temporary file in the destination's own
//! directory, synced, then renamed over the destination. Readers observe
//! either the old file or the complete new one. A temporary file that never
//! gets renamed is removed when it is dropped.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::errors::{DocumentError, DocumentResult, FetchError};
use crate::models::ScheduleDocument;

#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

/// Step at which an atomic write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteStage {
    /// Creating, filling or syncing the temporary file
    Temp,
    /// Renaming the temporary file over the destination
    Replace,
}

/// Replace `path` with `contents`
pub fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    write_atomically_with(path, contents, |file, bytes| file.write_all(bytes))
        .map_err(|(_, err)| err)
}

/// Like [`write_atomically`], with the body written by `writer`
pub(crate) fn write_atomically_with<F>(
    path: &Path,
    contents: &[u8],
    writer: F,
) -> Result<(), (WriteStage, io::Error)>
where
    F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut builder = tempfile::Builder::new();
    builder.prefix(".").suffix(".tmp");
    // New files get the umask-filtered mode a plain create would give them
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(NEW_FILE_MODE));
    }
    let mut temp = builder
        .tempfile_in(dir)
        .map_err(|e| (WriteStage::Temp, e))?;

    // Keep the mode of the file being replaced
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| (WriteStage::Temp, e))?;
    }

    writer(temp.as_file_mut(), contents).map_err(|e| (WriteStage::Temp, e))?;
    temp.as_file_mut()
        .flush()
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| (WriteStage::Temp, e))?;

    temp.persist(path)
        .map(|_| ())
        .map_err(|e| (WriteStage::Replace, e.error))
}

/// Store a normalized logo at `destination`, creating its directory first
pub fn store_asset(destination: &Path, encoded: &[u8]) -> Result<(), FetchError> {
    let storage_error = |source: io::Error| FetchError::Storage {
        path: destination.to_path_buf(),
        source,
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(storage_error)?;
    }

    write_atomically(destination, encoded).map_err(storage_error)
}

/// Serialize `document` and atomically replace the file at `path`
///
/// On any failure the original file is left exactly as it was.
pub fn persist_document(path: &Path, document: &ScheduleDocument) -> DocumentResult<()> {
    let bytes = document.to_pretty_bytes()?;
    persist_bytes_with(path, &bytes, |file, bytes| file.write_all(bytes))?;
    debug!("Persisted schedule document {}", path.display());
    Ok(())
}

fn persist_bytes_with<F>(path: &Path, bytes: &[u8], writer: F) -> DocumentResult<()>
where
    F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    write_atomically_with(path, bytes, writer).map_err(|(stage, source)| match stage {
        WriteStage::Temp => DocumentError::Write {
            path: path.to_path_buf(),
            source,
        },
        WriteStage::Replace => DocumentError::Replace {
            path: path.to_path_buf(),
            source,
        },
    })
}
