use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use strum::Display;

use super::Quorum;
use crate::endpoint::Endpoint;
use crate::errors::StorageError;
use crate::format::SlotFormat;
use crate::storage::StorageApi;

/// Routing state of one slot.
#[derive(Serialize, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    #[strum(serialize = "active")]
    Active,
    #[strum(serialize = "ignored")]
    Ignored,
    #[strum(serialize = "offline")]
    Offline,
}

/// One positional member of an erasure set.
pub struct DiskSlot {
    index: usize,
    endpoint: Endpoint,
    disk: Option<StorageApi>,
    ignored: bool,
    format: SlotFormat,
    online: AtomicBool,
}

impl DiskSlot {
    pub(super) fn new(
        index: usize,
        endpoint: Endpoint,
        disk: Option<StorageApi>,
        ignored: bool,
        format: SlotFormat,
    ) -> Self {
        let online = disk.is_some() && format.is_consistent();
        DiskSlot {
            index,
            endpoint,
            disk,
            ignored,
            format,
            online: AtomicBool::new(online),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The backend handle, `None` when the disk could not be opened.
    pub fn disk(&self) -> Option<&StorageApi> {
        self.disk.as_ref()
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Outcome of format validation for this slot.
    pub fn format(&self) -> &SlotFormat {
        &self.format
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub(super) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    /// Why the slot is not serving, if it is not.
    pub fn fault(&self) -> Option<StorageError> {
        match &self.format {
            SlotFormat::Faulty(err) => Some(err.clone()),
            SlotFormat::Unformatted => Some(StorageError::UnformattedDisk),
            SlotFormat::Inconsistent(_) => Some(StorageError::InconsistentDisk),
            SlotFormat::Ignored | SlotFormat::Consistent(_) => None,
        }
    }

    // A slot that failed validation stays offline until the set is rebuilt.
    pub fn state(&self) -> SlotState {
        if self.ignored {
            SlotState::Ignored
        } else if self.format.is_consistent() && self.is_online() {
            SlotState::Active
        } else {
            SlotState::Offline
        }
    }
}

/// An ordered, fixed-size collection of disks forming one erasure volume.
///
/// The slot list never shrinks: ignored and offline disks keep their
/// position, because member lists in the format metadata are ordered.
pub struct ErasureSet {
    volume_id: String,
    members: Vec<String>,
    slots: Vec<DiskSlot>,
    quorum: Quorum,
    probe_timeout: Duration,
}

impl ErasureSet {
    pub(super) fn new(
        volume_id: String,
        members: Vec<String>,
        slots: Vec<DiskSlot>,
        quorum: Quorum,
        probe_timeout: Duration,
    ) -> Self {
        ErasureSet {
            volume_id,
            members,
            slots,
            quorum,
            probe_timeout,
        }
    }

    pub fn volume_id(&self) -> &str {
        &self.volume_id
    }

    /// Disk ids of the volume, in slot order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn set_drive_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[DiskSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&DiskSlot> {
        self.slots.get(index)
    }

    pub fn quorum(&self) -> Quorum {
        self.quorum
    }

    pub fn read_quorum(&self) -> usize {
        self.quorum.read
    }

    pub fn write_quorum(&self) -> usize {
        self.quorum.write
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn ignored_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_ignored()).count()
    }

    pub fn ignored_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|s| s.is_ignored())
            .map(|s| s.index())
            .collect()
    }

    pub fn online_count(&self) -> usize {
        self.count_state(SlotState::Active)
    }

    pub fn offline_count(&self) -> usize {
        self.count_state(SlotState::Offline)
    }

    /// Backends eligible for object I/O, with their slot index.
    pub fn active_disks(&self) -> Vec<(usize, &StorageApi)> {
        self.slots
            .iter()
            .filter(|s| s.state() == SlotState::Active)
            .filter_map(|s| s.disk().map(|disk| (s.index(), disk)))
            .collect()
    }

    pub fn has_read_quorum(&self) -> bool {
        self.online_count() >= self.quorum.read
    }

    pub fn has_write_quorum(&self) -> bool {
        self.online_count() >= self.quorum.write
    }

    fn count_state(&self, state: SlotState) -> usize {
        self.slots.iter().filter(|s| s.state() == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: usize, ignored: bool, format: SlotFormat) -> DiskSlot {
        let endpoint = Endpoint::new(&format!("/mnt/disk{}", index)).unwrap();
        DiskSlot::new(index, endpoint, None, ignored, format)
    }

    #[test]
    fn test_slot_state() {
        let s = slot(0, true, SlotFormat::Ignored);
        assert_eq!(s.state(), SlotState::Ignored);
        assert_eq!(s.fault(), None);

        let s = slot(1, false, SlotFormat::Consistent("id".to_owned()));
        // No backend handle, so never online.
        assert_eq!(s.state(), SlotState::Offline);
        s.set_online(true);
        assert_eq!(s.state(), SlotState::Active);

        let s = slot(2, false, SlotFormat::Unformatted);
        s.set_online(true);
        assert_eq!(s.state(), SlotState::Offline);
        assert_eq!(s.fault(), Some(StorageError::UnformattedDisk));

        assert_eq!(SlotState::Active.to_string(), "active");
        assert_eq!(serde_json::to_string(&SlotState::Offline).unwrap(), "\"offline\"");
    }

    #[test]
    fn test_set_counts() {
        let quorum = Quorum::with_default_parity(4).unwrap();
        let slots = vec![
            slot(0, true, SlotFormat::Ignored),
            slot(1, false, SlotFormat::Consistent("b".to_owned())),
            slot(2, false, SlotFormat::Consistent("c".to_owned())),
            slot(3, false, SlotFormat::Faulty(StorageError::DiskTimeout)),
        ];
        slots[1].set_online(true);
        slots[2].set_online(true);
        let set = ErasureSet::new(
            "vol".to_owned(),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            slots,
            quorum,
            Duration::from_secs(1),
        );

        assert_eq!(set.set_drive_count(), 4);
        assert_eq!(set.ignored_count(), 1);
        assert_eq!(set.ignored_indices(), vec![0]);
        assert_eq!(set.online_count(), 2);
        assert_eq!(set.offline_count(), 1);
        assert!(set.has_read_quorum());
        assert!(!set.has_write_quorum());
        // Handles are absent in this fixture.
        assert!(set.active_disks().is_empty());
    }
}
