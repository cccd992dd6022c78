use crate::core::{Result, StoreError};
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
pub(crate) async fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|err| {
            StoreError::IoError(format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                err
            ))
        })?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await.map_err(|err| {
        StoreError::IoError(format!(
            "Failed to write temp file '{}': {}",
            tmp.display(),
            err
        ))
    })?;

    fs::rename(&tmp, path).await.map_err(|err| {
        StoreError::IoError(format!(
            "Failed to rename temp file '{}' -> '{}': {}",
            tmp.display(),
            path.display(),
            err
        ))
    })?;

    Ok(())
}

/// Reads a file, mapping "not found" to `Ok(None)`.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StoreError::IoError(format!(
            "Failed to read '{}': {}",
            path.display(),
            err
        ))),
    }
}

/// Removes a file; a missing file is not an error.
pub(crate) async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StoreError::IoError(format!(
            "Failed to delete '{}': {}",
            path.display(),
            err
        ))),
    }
}

pub(crate) fn encode<T: Serialize>(value: &T, pretty: bool) -> Result<Vec<u8>> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    Ok(bytes)
}

pub(crate) fn decode<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|err| {
        StoreError::Serialization(format!("Malformed '{}': {}", path.display(), err))
    })
}
