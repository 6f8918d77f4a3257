//! Output-folder housekeeping for the CLI: removing previously generated files.

use crate::error::{ProtoError, Result};
use std::path::{Path, PathBuf};

/// Delete every regular file in `dir` with the given extension. Returns the removed paths.
///
/// A missing directory is not an error. Files are removed whether or not
/// this tool generated them.
pub fn clean_dir(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut removed = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|e| ProtoError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| ProtoError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            std::fs::remove_file(&path).map_err(|e| ProtoError::io(&path, e))?;
            tracing::debug!(path = %path.display(), "removed");
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}

/// Remove `dir` if it exists, is empty, and is not the current directory.
/// Returns whether it was removed.
pub fn remove_dir(dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let cwd = std::env::current_dir().map_err(|e| ProtoError::io(".", e))?;
    let same = match (std::fs::canonicalize(dir), std::fs::canonicalize(&cwd)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if same {
        return Ok(false);
    }
    std::fs::remove_dir(dir).map_err(|e| ProtoError::io(dir, e))?;
    Ok(true)
}
