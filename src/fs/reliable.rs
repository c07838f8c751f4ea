use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use super::*;
use crate::errors::StorageError;

/// Creates `path` and any missing parents, mapping failures to disk errors.
pub async fn reliable_mkdir_all(path: impl AsRef<Path>, mode: u32) -> Result<(), StorageError> {
    let path_str = path.as_ref().to_string_lossy();
    check_path_length(path_str.as_ref())?;

    if let Err(err) = reliable_mkdir_all_inner(path.as_ref(), mode).await {
        return if err_not_dir(&err) || err_not_found(&err) {
            Err(StorageError::FileAccessDenied)
        } else {
            Err(StorageError::from_io(err))
        };
    }
    Ok(())
}

async fn reliable_mkdir_all_inner(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut first = true;
    loop {
        match mkdir_all(path, mode).await {
            Err(err) => {
                // Retry only for the first retryable error.
                if err.kind() == ErrorKind::NotFound && first {
                    first = false;
                    continue;
                }
                return Err(err);
            }
            Ok(_) => return Ok(()),
        }
    }
}

async fn mkdir_all(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path).await
}

/// Renames `src` to `dst`, creating the parent directories of `dst` first.
pub async fn reliable_rename(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
) -> Result<(), StorageError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    check_path_length(&dst.to_string_lossy())?;
    if let Some(parent) = dst.parent() {
        reliable_mkdir_all(parent, 0o777).await?;
    }

    let mut first = true;
    loop {
        match fs::rename(src, dst).await {
            Err(err) => {
                // Parent may have been removed concurrently, retry once.
                if err.kind() == ErrorKind::NotFound && first {
                    first = false;
                    if let Some(parent) = dst.parent() {
                        reliable_mkdir_all(parent, 0o777).await?;
                    }
                    continue;
                }
                return Err(StorageError::from_io(err));
            }
            Ok(_) => return Ok(()),
        }
    }
}
