use std::time::Duration;

use futures_util::future::join_all;
use log::{info, warn};
use serde::Serialize;

use super::*;
use crate::errors::StorageError;
use crate::storage::{DiskInfo, StorageApi};

/// Capacity report of one slot.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DiskReport {
    pub index: usize,
    pub endpoint: String,
    pub state: SlotState,
    pub total: u64,
    pub free: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Capacity of an erasure set, summed over the disks currently serving it.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageInfo {
    pub total: u64,
    pub free: u64,
    pub online_disks: usize,
    pub offline_disks: usize,
    pub ignored_disks: usize,
    pub disks: Vec<DiskReport>,
}

impl StorageInfo {
    /// `false` when no disk responded, in which case `total` and `free`
    /// carry no information.
    pub fn is_usable(&self) -> bool {
        self.online_disks > 0
    }
}

/// Queries every disk of `set` and sums the capacity of the active ones.
///
/// Disks that fail or time out are marked offline and left out of the sums.
/// Ignored disks are queried and reported, but never counted.
pub async fn storage_info(set: &ErasureSet) -> StorageInfo {
    let timeout = set.probe_timeout();
    let futures = set
        .slots()
        .iter()
        .map(|slot| disk_info_timeout(slot.disk(), timeout));
    let results = join_all(futures).await;

    let mut info = StorageInfo {
        disks: Vec::with_capacity(set.set_drive_count()),
        ..Default::default()
    };
    for (slot, res) in set.slots().iter().zip(results) {
        let was_online = slot.is_online();
        slot.set_online(res.is_ok());
        if !slot.is_ignored() {
            match (&res, was_online) {
                (Err(err), true) => warn!(
                    "disk {} ({}) went offline: {}",
                    slot.index(),
                    slot.endpoint(),
                    err
                ),
                (Ok(_), false) if slot.format().is_consistent() => {
                    info!("disk {} ({}) is back online", slot.index(), slot.endpoint())
                }
                _ => {}
            }
        }

        let state = slot.state();
        let mut report = DiskReport {
            index: slot.index(),
            endpoint: slot.endpoint().to_string(),
            state,
            total: 0,
            free: 0,
            error: None,
        };
        match res {
            Ok(disk_info) => {
                report.total = disk_info.total;
                report.free = disk_info.free.min(disk_info.total);
            }
            Err(err) => report.error = Some(err.to_string()),
        }
        if report.error.is_none() {
            if let Some(fault) = slot.fault() {
                report.error = Some(fault.to_string());
            }
        }

        match state {
            SlotState::Active => {
                info.online_disks += 1;
                info.total = info.total.saturating_add(report.total);
                info.free = info.free.saturating_add(report.free);
            }
            SlotState::Offline => info.offline_disks += 1,
            SlotState::Ignored => info.ignored_disks += 1,
        }
        info.disks.push(report);
    }
    info
}

async fn disk_info_timeout(
    disk: Option<&StorageApi>,
    timeout: Duration,
) -> Result<DiskInfo, StorageError> {
    let disk = match disk {
        Some(disk) => disk,
        None => return Err(StorageError::DiskNotFound),
    };
    match tokio::time::timeout(timeout, disk.disk_info()).await {
        Ok(res) => res,
        Err(_) => Err(StorageError::DiskTimeout),
    }
}
