//! Atomic file operations to prevent corrupted cache files

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tether_core::{Failure, Result};
use uuid::Uuid;

/// ENOSPC
#[cfg(unix)]
const NO_SPACE_OS_ERROR: i32 = 28;
/// ERROR_DISK_FULL
#[cfg(windows)]
const NO_SPACE_OS_ERROR: i32 = 112;

/// Map an I/O error on `path` to the matching storage failure
pub fn storage_failure(path: &Path, operation: &str, error: io::Error) -> Failure {
    if error.kind() == io::ErrorKind::PermissionDenied {
        return Failure::permission_denied(path.display().to_string());
    }
    #[cfg(any(unix, windows))]
    if error.raw_os_error() == Some(NO_SPACE_OS_ERROR) {
        return Failure::insufficient_space();
    }
    Failure::database_error(operation, format!("{}: {error}", path.display()))
}

/// Write data to a file atomically by writing to a temporary file and renaming
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Failure::invalid_input("path", "no parent directory"))?;

    // Ensure parent directory exists
    fs::create_dir_all(parent)
        .map_err(|e| storage_failure(parent, "create parent directory", e))?;

    // Create temporary file in the same directory to ensure atomic rename
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

    // Write to temporary file
    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| storage_failure(&temp_path, "create temporary file", e))?;

        file.write_all(content)
            .map_err(|e| storage_failure(&temp_path, "write temporary file", e))?;

        file.sync_all()
            .map_err(|e| storage_failure(&temp_path, "sync temporary file", e))?;

        Ok(())
    })();

    // If writing failed, clean up temp file
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        storage_failure(path, "atomic rename", e)
    })?;

    Ok(())
}
