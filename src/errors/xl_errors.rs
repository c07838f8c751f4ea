use std::fmt;

use thiserror::Error;

use super::StorageError;

/// Outcome of building or formatting an erasure set.
///
/// Single disk faults are absorbed by the set and reflected in the slot
/// states; only set-wide conditions are surfaced through this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XlError {
    #[error("Invalid arguments specified: {0}")]
    InvalidArgument(String),

    #[error("disks are not formatted, run format first")]
    NotFormatted,

    #[error("disk formats do not match: {0}")]
    FormatMismatch(MismatchReason),

    #[error("insufficient disks with a consistent format, found {consistent} need {required}")]
    InsufficientQuorum { consistent: usize, required: usize },

    #[error("disk {index} is unavailable: {source}")]
    DiskUnavailable {
        index: usize,
        #[source]
        source: StorageError,
    },
}

impl XlError {
    /// Whether the condition may clear up by itself once disks recover.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            XlError::InsufficientQuorum { .. } | XlError::DiskUnavailable { .. }
        )
    }
}

/// Why a disk's format metadata was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// The disk belongs to a different volume.
    VolumeId { index: usize },
    /// The disk's member list differs from the rest of the set.
    MemberList { index: usize },
    /// The disk sits at a different position than recorded at format time.
    SlotIndex { expected: usize, found: usize },
    /// The recorded member list does not have one entry per disk.
    MemberCount { expected: usize, found: usize },
    /// Some disks are formatted and others are not.
    PartiallyFormatted { formatted: usize, unformatted: usize },
    /// The format file exists but cannot be parsed.
    Corrupted { index: usize },
    UnsupportedVersion(u32),
    UnsupportedBackend(String),
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MismatchReason::*;
        match self {
            VolumeId { index } => write!(f, "disk {} belongs to a different volume", index),
            MemberList { index } => write!(f, "disk {} has an unexpected member list", index),
            SlotIndex { expected, found } => write!(
                f,
                "disk at position {} was formatted for position {}",
                expected, found
            ),
            MemberCount { expected, found } => write!(
                f,
                "member list has {} disks, expected {}",
                found, expected
            ),
            PartiallyFormatted {
                formatted,
                unformatted,
            } => write!(
                f,
                "{} disks formatted, {} unformatted, repair is required",
                formatted, unformatted
            ),
            Corrupted { index } => write!(f, "disk {} has a corrupted format", index),
            UnsupportedVersion(v) => write!(f, "unsupported format version {}", v),
            UnsupportedBackend(b) => write!(f, "unsupported backend format '{}'", b),
        }
    }
}
