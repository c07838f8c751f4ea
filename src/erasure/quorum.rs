use serde::Serialize;

use crate::errors::XlError;

/// Data/parity split of an erasure set and the quorums derived from it.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quorum {
    pub data: usize,
    pub parity: usize,
    pub read: usize,
    pub write: usize,
}

impl Quorum {
    /// Splits `set_drive_count` disks into data and `parity` blocks.
    ///
    /// Read quorum is the data count; write quorum is one more than that,
    /// but never above the number of disks.
    pub fn new(set_drive_count: usize, parity: usize) -> Result<Quorum, XlError> {
        if set_drive_count == 0 {
            return Err(XlError::InvalidArgument("no disks supplied".to_owned()));
        }
        if parity >= set_drive_count {
            return Err(XlError::InvalidArgument(format!(
                "parity {} leaves no data disks in a set of {}",
                parity, set_drive_count
            )));
        }
        let data = set_drive_count - parity;
        Ok(Quorum {
            data,
            parity,
            read: data,
            write: (data + 1).min(set_drive_count),
        })
    }

    /// Uses half of the disks for parity.
    pub fn with_default_parity(set_drive_count: usize) -> Result<Quorum, XlError> {
        Quorum::new(set_drive_count, default_parity(set_drive_count))
    }

    pub fn set_drive_count(&self) -> usize {
        self.data + self.parity
    }

    /// How many disks may be left out of a write.
    pub fn tolerated_write_faults(&self) -> usize {
        self.set_drive_count() - self.write
    }
}

pub fn default_parity(set_drive_count: usize) -> usize {
    set_drive_count / 2
}
