use std::time::Duration;

use futures_util::future::join_all;
use log::warn;
use serde::{Deserialize, Serialize};

use super::*;
use crate::errors::{MismatchReason, StorageError};
use crate::globals::SYSTEM_META_BUCKET;
use crate::storage::StorageApi;

// formatErasureV1.Erasure.Version - version '1'.
pub const FORMAT_ERASURE_VERSION_V1: u32 = 1;

/// Format metadata persisted on every disk of an erasure set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FormatErasureV1 {
    #[serde(flatten)]
    pub meta: FormatMetaV1,
    #[serde(rename = "xl")]
    pub erasure: ErasureV1,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErasureV1 {
    pub version: u32,
    /// Identifier of the disk carrying this record.
    pub this: String,
    /// Position of this disk in `disks`.
    pub index: usize,
    /// Identifiers of all members, in slot order.
    pub disks: Vec<String>,
}

impl FormatErasureV1 {
    /// Generates the format of a fresh volume with `set_drive_count` disks.
    ///
    /// The result describes the volume as a whole; use [`for_disk`] to get
    /// the record to persist on a particular disk.
    ///
    /// [`for_disk`]: FormatErasureV1::for_disk
    pub fn new(set_drive_count: usize) -> Self {
        let disks = (0..set_drive_count)
            .map(|_| uuid::Uuid::new_v4().to_string())
            .collect();
        FormatErasureV1 {
            meta: FormatMetaV1::new(uuid::Uuid::new_v4().to_string()),
            erasure: ErasureV1 {
                version: FORMAT_ERASURE_VERSION_V1,
                this: "".to_owned(),
                index: 0,
                disks,
            },
        }
    }

    /// Returns the record for the disk at `index`, or `None` when out of range.
    pub fn for_disk(&self, index: usize) -> Option<FormatErasureV1> {
        let this = self.erasure.disks.get(index)?.clone();
        let mut format = self.clone();
        format.erasure.this = this;
        format.erasure.index = index;
        Some(format)
    }

    pub fn volume_id(&self) -> &str {
        &self.meta.id
    }

    pub fn members(&self) -> &[String] {
        &self.erasure.disks
    }

    /// Whether both records describe the same volume with the same member list.
    pub fn same_volume(&self, other: &FormatErasureV1) -> bool {
        self.meta.id == other.meta.id && self.erasure.disks == other.erasure.disks
    }

    /// Explains how `other` differs from this volume, if it does.
    pub fn volume_mismatch(&self, other: &FormatErasureV1, index: usize) -> Option<MismatchReason> {
        if self.meta.id != other.meta.id {
            Some(MismatchReason::VolumeId { index })
        } else if self.erasure.disks != other.erasure.disks {
            Some(MismatchReason::MemberList { index })
        } else {
            None
        }
    }

    /// Validates the version and backend fields.
    pub fn check_values(&self) -> Result<(), MismatchReason> {
        if self.meta.version != FORMAT_META_VERSION_V1 {
            return Err(MismatchReason::UnsupportedVersion(self.meta.version));
        }
        if self.meta.format != FORMAT_BACKEND_ERASURE {
            return Err(MismatchReason::UnsupportedBackend(self.meta.format.clone()));
        }
        if self.erasure.version != FORMAT_ERASURE_VERSION_V1 {
            return Err(MismatchReason::UnsupportedVersion(self.erasure.version));
        }
        Ok(())
    }

    /// Validates that this record belongs at `index` of a set of `set_drive_count` disks.
    pub fn check_position(&self, index: usize, set_drive_count: usize) -> Result<(), MismatchReason> {
        if self.erasure.disks.len() != set_drive_count {
            return Err(MismatchReason::MemberCount {
                expected: set_drive_count,
                found: self.erasure.disks.len(),
            });
        }
        if self.erasure.index != index {
            return Err(MismatchReason::SlotIndex {
                expected: index,
                found: self.erasure.index,
            });
        }
        if self.erasure.disks[index] != self.erasure.this {
            return Err(MismatchReason::MemberList { index });
        }
        Ok(())
    }
}

/// Reads the format metadata of one disk.
pub async fn load_format_erasure(disk: &StorageApi) -> Result<FormatErasureV1, StorageError> {
    let data = match disk.read_all(SYSTEM_META_BUCKET, FORMAT_CONFIG_FILE).await {
        Ok(data) => data,
        Err(StorageError::FileNotFound) | Err(StorageError::VolumeNotFound) => {
            return Err(StorageError::UnformattedDisk);
        }
        Err(err) => return Err(err),
    };
    serde_json::from_slice(&data).map_err(|err| {
        warn!("unable to parse format on {}: {}", disk.endpoint(), err);
        StorageError::CorruptedFormat
    })
}

/// Persists `format` on one disk.
pub async fn save_format_erasure(
    disk: &StorageApi,
    format: &FormatErasureV1,
) -> Result<(), StorageError> {
    let data = serde_json::to_vec(format).map_err(|_| StorageError::Unexpected)?;
    match disk.make_volume(SYSTEM_META_BUCKET).await {
        Ok(_) | Err(StorageError::VolumeExists) => {}
        Err(err) => return Err(err),
    }
    disk.write_all(SYSTEM_META_BUCKET, FORMAT_CONFIG_FILE, &data)
        .await
}

/// Loads the format of every disk concurrently, each bounded by `timeout`.
///
/// `None` entries are skipped and stay `None` in the result.
pub async fn load_format_erasure_all(
    disks: &[Option<&StorageApi>],
    timeout: Duration,
) -> Vec<Option<Result<FormatErasureV1, StorageError>>> {
    let futures = disks.iter().enumerate().map(|(index, disk)| async move {
        match disk {
            Some(disk) => Some(load_format_erasure_timeout(index, disk, timeout).await),
            None => None,
        }
    });
    join_all(futures).await
}

async fn load_format_erasure_timeout(
    index: usize,
    disk: &StorageApi,
    timeout: Duration,
) -> Result<FormatErasureV1, StorageError> {
    match tokio::time::timeout(timeout, load_format_erasure(disk)).await {
        Ok(res) => res,
        Err(_) => {
            warn!(
                "disk {} ({}) did not return its format within {:?}",
                index,
                disk.endpoint(),
                timeout
            );
            Err(StorageError::DiskTimeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_format() {
        let format = FormatErasureV1::new(16);
        assert_eq!(format.members().len(), 16);
        assert_eq!(format.check_values(), Ok(()));

        let mut ids = format.members().to_vec();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);

        let disk3 = format.for_disk(3).unwrap();
        assert_eq!(disk3.erasure.this, format.members()[3]);
        assert_eq!(disk3.erasure.index, 3);
        assert!(disk3.same_volume(&format));
        assert_eq!(disk3.check_position(3, 16), Ok(()));
        assert!(format.for_disk(16).is_none());
    }

    #[test]
    fn test_check_position() {
        let format = FormatErasureV1::new(4);
        let disk1 = format.for_disk(1).unwrap();
        assert_eq!(
            disk1.check_position(2, 4),
            Err(MismatchReason::SlotIndex {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            disk1.check_position(1, 5),
            Err(MismatchReason::MemberCount {
                expected: 5,
                found: 4
            })
        );

        let mut forged = disk1.clone();
        forged.erasure.this = "someone-else".to_owned();
        assert_eq!(
            forged.check_position(1, 4),
            Err(MismatchReason::MemberList { index: 1 })
        );
    }

    #[test]
    fn test_check_values() {
        let mut format = FormatErasureV1::new(4);
        format.meta.format = "fs".to_owned();
        assert_eq!(
            format.check_values(),
            Err(MismatchReason::UnsupportedBackend("fs".to_owned()))
        );

        let mut format = FormatErasureV1::new(4);
        format.erasure.version = 3;
        assert_eq!(
            format.check_values(),
            Err(MismatchReason::UnsupportedVersion(3))
        );

        let mut format = FormatErasureV1::new(4);
        format.meta.version = 2;
        assert_eq!(
            format.check_values(),
            Err(MismatchReason::UnsupportedVersion(2))
        );
    }

    #[test]
    fn test_volume_mismatch() {
        let a = FormatErasureV1::new(4);
        let b = FormatErasureV1::new(4);
        assert_eq!(
            a.volume_mismatch(&b, 2),
            Some(MismatchReason::VolumeId { index: 2 })
        );

        let mut c = a.clone();
        c.erasure.disks.swap(0, 1);
        assert_eq!(
            a.volume_mismatch(&c, 0),
            Some(MismatchReason::MemberList { index: 0 })
        );
        assert_eq!(a.volume_mismatch(&a.for_disk(0).unwrap(), 0), None);
    }

    #[test]
    fn test_format_json_layout() {
        let format = FormatErasureV1::new(2).for_disk(1).unwrap();
        let value: serde_json::Value = serde_json::to_value(&format).unwrap();
        assert_eq!(value["version"], 1);
        assert!(value["version"].is_u64());
        assert_eq!(value["format"], "xl");
        assert_eq!(value["id"], format.volume_id());
        assert_eq!(value["xl"]["version"], 1);
        assert_eq!(value["xl"]["index"], 1);
        assert_eq!(value["xl"]["this"], format.members()[1].as_str());
        assert_eq!(value["xl"]["disks"].as_array().unwrap().len(), 2);

        let parsed: FormatErasureV1 = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, format);
    }
}
