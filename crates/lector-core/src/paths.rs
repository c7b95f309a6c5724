//! Data directory resolution.

use std::env;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LECTOR_DATA_DIR";

/// Errors from resolving or creating application paths.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// Failed to create a directory.
    #[error("Failed to create directory {}: {}", .path.display(), .reason)]
    CreateFailed { path: PathBuf, reason: String },
}

/// Root directory for lector's persistent data.
///
/// Resolution order:
/// 1. The `LECTOR_DATA_DIR` environment variable, taken as-is.
/// 2. The platform data directory plus `lector`
///    (e.g. `~/.local/share/lector`), created if missing.
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    let root = base.join("lector");
    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(root)
}
