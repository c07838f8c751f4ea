use std::convert::TryFrom;

use thiserror::Error;

/// Faults reported by a single disk.
///
/// These never abort an erasure set on their own; they are reduced across
/// all disks of the set and only surface when they break quorum.
#[derive(Debug, Error, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StorageError {
    #[error("unexpected error, please report this issue at https://github.com/hulk/hulk/issues")]
    Unexpected,

    #[error("corrupted backend format, specified disk mount has unexpected previous content")]
    CorruptedFormat,

    #[error("unformatted disk found")]
    UnformattedDisk,

    #[error("inconsistent disk found")]
    InconsistentDisk,

    #[error("disk path full")]
    DiskFull,

    #[error("disk is not directory or mountpoint")]
    DiskNotDir,

    #[error("disk not found")]
    DiskNotFound,

    #[error("disk is faulty")]
    FaultyDisk,

    #[error("disk access denied")]
    DiskAccessDenied,

    #[error("disk did not respond in time")]
    DiskTimeout,

    #[error("file not found")]
    FileNotFound,

    #[error("too many open files, please increase 'ulimit -n'")]
    TooManyOpenFiles,

    #[error("file name too long")]
    FileNameTooLong,

    #[error("volume already exists")]
    VolumeExists,

    #[error("volume not found")]
    VolumeNotFound,

    #[error("file access denied")]
    FileAccessDenied,
}

/// Errors meaning the disk itself could not be reached.
pub const BASE_STORAGE_ERRORS: [StorageError; 3] = [
    StorageError::DiskNotFound,
    StorageError::FaultyDisk,
    StorageError::DiskTimeout,
];

impl TryFrom<std::io::Error> for StorageError {
    type Error = std::io::Error;

    fn try_from(err: std::io::Error) -> Result<Self, Self::Error> {
        use crate::fs;
        if fs::err_not_found(&err) || fs::err_not_dir(&err) || fs::err_is_dir(&err) {
            return Ok(StorageError::FileNotFound);
        } else if fs::err_permission(&err) {
            return Ok(StorageError::FileAccessDenied);
        } else if fs::err_too_many_files(&err) {
            return Ok(StorageError::TooManyOpenFiles);
        } else if fs::err_too_long(&err) {
            return Ok(StorageError::FileNameTooLong);
        } else if fs::err_io(&err) {
            return Ok(StorageError::FaultyDisk);
        } else if fs::err_no_space(&err) {
            return Ok(StorageError::DiskFull);
        }
        Err(err)
    }
}

impl StorageError {
    /// Classifies an io error, treating anything unrecognized as a faulty disk.
    pub fn from_io(err: std::io::Error) -> StorageError {
        StorageError::try_from(err).unwrap_or_else(|err| {
            log::debug!("unclassified disk io error: {}", err);
            StorageError::FaultyDisk
        })
    }

    /// Whether the error means the disk could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        BASE_STORAGE_ERRORS.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Error, ErrorKind};

    use super::*;

    #[test]
    fn test_classify_io_errors() {
        assert_eq!(
            StorageError::from_io(Error::from(ErrorKind::NotFound)),
            StorageError::FileNotFound
        );
        assert_eq!(
            StorageError::from_io(Error::from(ErrorKind::PermissionDenied)),
            StorageError::FileAccessDenied
        );
        assert_eq!(
            StorageError::from_io(Error::from_raw_os_error(libc::ENOSPC)),
            StorageError::DiskFull
        );
        assert_eq!(
            StorageError::from_io(Error::from_raw_os_error(libc::EIO)),
            StorageError::FaultyDisk
        );
        assert!(StorageError::try_from(Error::from(ErrorKind::Interrupted)).is_err());
    }

    #[test]
    fn test_unreachable_errors() {
        assert!(StorageError::DiskTimeout.is_unreachable());
        assert!(StorageError::DiskNotFound.is_unreachable());
        assert!(!StorageError::UnformattedDisk.is_unreachable());
    }
}
