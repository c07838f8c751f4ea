use std::time::Duration;

use futures_util::future::join_all;
use log::{info, warn};

use super::*;
use crate::config::XlConfig;
use crate::endpoint::{Endpoint, Endpoints};
use crate::errors::{StorageError, XlError};
use crate::format::{
    init_format_erasure, load_format_erasure_all, validate_format_erasure, FormatErasureV1,
    SlotFormat,
};
use crate::storage::{new_storage_api, StorageApi};

/// Builds the erasure set over `disks`, leaving `ignored_disks` out of routing.
///
/// The disks must have been formatted beforehand, see [`format_disks`].
/// Entries of `ignored_disks` that are not part of `disks` have no effect.
pub async fn new_xl_objects(
    disks: &[String],
    ignored_disks: &[String],
    config: &XlConfig,
) -> Result<ErasureSet, XlError> {
    let endpoints = Endpoints::new(disks)?;
    let ignored = endpoints.indices_of(ignored_disks);
    let backends = open_disks(&endpoints, config.probe_timeout).await;
    build_erasure_set(endpoints, backends, &ignored, config).await
}

/// Writes fresh format metadata to every disk in `disks`.
///
/// Succeeds without writing when the disks already form the same volume.
pub async fn format_disks(
    disks: &[String],
    config: &XlConfig,
) -> Result<FormatErasureV1, XlError> {
    let endpoints = Endpoints::new(disks)?;
    // Reject a parity the set could never be built with.
    quorum_for(endpoints.len(), config)?;

    let mut opened = Vec::with_capacity(endpoints.len());
    for (index, backend) in open_disks(&endpoints, config.probe_timeout)
        .await
        .into_iter()
        .enumerate()
    {
        match backend {
            Ok(disk) => opened.push(disk),
            Err(source) => return Err(XlError::DiskUnavailable { index, source }),
        }
    }
    init_format_erasure(&opened, config.probe_timeout).await
}

fn quorum_for(set_drive_count: usize, config: &XlConfig) -> Result<Quorum, XlError> {
    match config.parity {
        Some(parity) => Quorum::new(set_drive_count, parity),
        None => Quorum::with_default_parity(set_drive_count),
    }
}

async fn open_disks(
    endpoints: &Endpoints,
    timeout: Duration,
) -> Vec<Result<StorageApi, StorageError>> {
    let futures = endpoints.iter().map(|endpoint| open_disk(endpoint.clone(), timeout));
    join_all(futures).await
}

async fn open_disk(endpoint: Endpoint, timeout: Duration) -> Result<StorageApi, StorageError> {
    let display = endpoint.to_string();
    match tokio::time::timeout(timeout, new_storage_api(endpoint)).await {
        Ok(Ok(disk)) => Ok(disk),
        Ok(Err(err)) => {
            warn!("unable to open disk {}: {}", display, err);
            Err(err)
        }
        Err(_) => {
            warn!("disk {} did not open within {:?}", display, timeout);
            Err(StorageError::DiskTimeout)
        }
    }
}

/// Validates the formats of already opened backends and assembles the set.
pub(super) async fn build_erasure_set(
    endpoints: Endpoints,
    backends: Vec<Result<StorageApi, StorageError>>,
    ignored: &[usize],
    config: &XlConfig,
) -> Result<ErasureSet, XlError> {
    let set_drive_count = endpoints.len();
    let quorum = quorum_for(set_drive_count, config)?;

    let validated = {
        let probes: Vec<Option<&StorageApi>> = backends
            .iter()
            .enumerate()
            .map(|(index, backend)| match backend {
                Ok(disk) if !ignored.contains(&index) => Some(disk),
                _ => None,
            })
            .collect();
        let mut formats = load_format_erasure_all(&probes, config.probe_timeout).await;
        // Disks that failed to open still count as probed.
        for (index, backend) in backends.iter().enumerate() {
            if let Err(err) = backend {
                if !ignored.contains(&index) {
                    formats[index] = Some(Err(err.clone()));
                }
            }
        }
        validate_format_erasure(&formats, quorum.read)?
    };

    let mut slots = Vec::with_capacity(set_drive_count);
    for (index, ((endpoint, backend), format)) in endpoints
        .into_iter()
        .zip(backends)
        .zip(validated.slots)
        .enumerate()
    {
        let mut disk = backend.ok();
        match &format {
            SlotFormat::Consistent(id) => {
                if let Some(disk) = disk.as_mut() {
                    disk.set_disk_id(id.clone());
                    disk.set_disk_index(index);
                }
            }
            SlotFormat::Unformatted => warn!("disk {} ({}) is not formatted", index, endpoint),
            SlotFormat::Inconsistent(reason) => {
                warn!("disk {} ({}) is offline: {}", index, endpoint, reason)
            }
            SlotFormat::Faulty(err) => warn!("disk {} ({}) is offline: {}", index, endpoint, err),
            SlotFormat::Ignored => {}
        }
        slots.push(DiskSlot::new(
            index,
            endpoint,
            disk,
            ignored.contains(&index),
            format,
        ));
    }

    let set = ErasureSet::new(
        validated.format.volume_id().to_owned(),
        validated.format.members().to_vec(),
        slots,
        quorum,
        config.probe_timeout,
    );
    info!(
        "erasure set {} ready: {} online, {} offline, {} ignored of {} disks (read quorum {}, write quorum {})",
        set.volume_id(),
        set.online_count(),
        set.offline_count(),
        set.ignored_count(),
        set.set_drive_count(),
        quorum.read,
        quorum.write
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::errors::MismatchReason;
    use crate::storage::NaughtyDisk;
    use crate::utils::assert::*;
    use crate::xl_storage::XlStorage;

    struct Disks {
        _root: TempDir,
        paths: Vec<String>,
    }

    fn new_disks(n: usize) -> Disks {
        let root = tempfile::tempdir().unwrap();
        let paths = (0..n)
            .map(|i| root.path().join(format!("disk{}", i)).to_string_lossy().into_owned())
            .collect();
        Disks { _root: root, paths }
    }

    fn config() -> XlConfig {
        XlConfig {
            parity: None,
            probe_timeout: Duration::from_secs(5),
        }
    }

    async fn open_naughty(
        endpoints: &Endpoints,
        naughty: usize,
        wrap: impl FnOnce(NaughtyDisk) -> NaughtyDisk,
    ) -> Vec<Result<StorageApi, StorageError>> {
        let mut backends = Vec::new();
        let mut wrap = Some(wrap);
        for (index, endpoint) in endpoints.iter().enumerate() {
            let storage = XlStorage::new(endpoint.clone()).await.unwrap();
            let wrapper = if index == naughty { wrap.take() } else { None };
            let disk = match wrapper {
                Some(wrapper) => StorageApi::Naughty(wrapper(NaughtyDisk::new(storage))),
                None => storage.into(),
            };
            backends.push(Ok(disk));
        }
        backends
    }

    #[tokio::test]
    async fn test_build_after_format() {
        let disks = new_disks(4);
        let format = assert_ok!(format_disks(&disks.paths, &config()).await);

        let set = assert_ok!(new_xl_objects(&disks.paths, &[], &config()).await);
        assert_eq!(set.volume_id(), format.volume_id());
        assert_eq!(set.members(), format.members());
        assert_eq!(set.online_count(), 4);
        assert_eq!(set.ignored_count(), 0);
        assert!(set.has_write_quorum());
        for (index, slot) in set.slots().iter().enumerate() {
            assert_eq!(slot.state(), SlotState::Active);
            let disk = slot.disk().unwrap();
            assert_eq!(disk.get_disk_id(), format.members()[index]);
            assert_eq!(disk.disk_index(), Some(index));
        }
    }

    #[tokio::test]
    async fn test_build_unformatted() {
        let disks = new_disks(4);
        let err = assert_err!(new_xl_objects(&disks.paths, &[], &config()).await);
        assert_eq!(err, XlError::NotFormatted);
    }

    #[tokio::test]
    async fn test_build_no_disks() {
        let err = assert_err!(new_xl_objects(&[], &[], &config()).await);
        assert!(matches!(err, XlError::InvalidArgument(_)));
        let err = assert_err!(format_disks(&[], &config()).await);
        assert!(matches!(err, XlError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_build_ignored_disks() {
        let disks = new_disks(4);
        assert_ok!(format_disks(&disks.paths, &config()).await);

        let ignored = vec![disks.paths[3].clone(), "/not/a/member".to_owned()];
        let set = assert_ok!(new_xl_objects(&disks.paths, &ignored, &config()).await);
        assert_eq!(set.set_drive_count(), 4);
        assert_eq!(set.ignored_indices(), vec![3]);
        assert_eq!(set.slots()[3].state(), SlotState::Ignored);
        assert!(set.slots()[3].disk().is_some());
        assert_eq!(set.online_count(), 3);
        assert_eq!(set.active_disks().len(), 3);

        // Ignoring beyond write quorum is a configuration, not a failure.
        let set = assert_ok!(new_xl_objects(&disks.paths, &disks.paths[2..], &config()).await);
        assert_eq!(set.online_count(), 2);
        assert!(set.has_read_quorum());
        assert!(!set.has_write_quorum());

        // Below read quorum the volume cannot be recognized.
        let err = assert_err!(new_xl_objects(&disks.paths, &disks.paths[1..], &config()).await);
        assert_eq!(
            err,
            XlError::InsufficientQuorum {
                consistent: 1,
                required: 2
            }
        );
    }

    #[tokio::test]
    async fn test_build_slow_disk() {
        let disks = new_disks(4);
        assert_ok!(format_disks(&disks.paths, &config()).await);

        let endpoints = Endpoints::new(&disks.paths).unwrap();
        let backends = open_naughty(&endpoints, 2, |disk| {
            disk.with_delay(Duration::from_secs(30))
        })
        .await;
        let config = XlConfig {
            parity: None,
            probe_timeout: Duration::from_millis(100),
        };
        let set = assert_ok!(build_erasure_set(endpoints, backends, &[], &config).await);
        assert_eq!(set.slots()[2].state(), SlotState::Offline);
        assert_eq!(set.slots()[2].fault(), Some(StorageError::DiskTimeout));
        assert_eq!(set.online_count(), 3);
        assert!(set.has_write_quorum());
    }

    #[tokio::test]
    async fn test_build_faulty_disk() {
        let disks = new_disks(4);
        assert_ok!(format_disks(&disks.paths, &config()).await);

        let endpoints = Endpoints::new(&disks.paths).unwrap();
        let backends =
            open_naughty(&endpoints, 0, |disk| disk.with_fault(StorageError::FaultyDisk)).await;
        let set = assert_ok!(build_erasure_set(endpoints, backends, &[], &config()).await);
        assert_eq!(set.slots()[0].state(), SlotState::Offline);
        assert_eq!(set.slots()[0].fault(), Some(StorageError::FaultyDisk));
        assert_eq!(set.online_count(), 3);
    }

    #[tokio::test]
    async fn test_build_disk_replaced_by_file() {
        let disks = new_disks(4);
        assert_ok!(format_disks(&disks.paths, &config()).await);

        let path = PathBuf::from(&disks.paths[1]);
        std::fs::remove_dir_all(&path).unwrap();
        std::fs::write(&path, b"not a disk").unwrap();

        let set = assert_ok!(new_xl_objects(&disks.paths, &[], &config()).await);
        assert_eq!(set.slots()[1].state(), SlotState::Offline);
        assert!(set.slots()[1].disk().is_none());
        assert_eq!(set.slots()[1].fault(), Some(StorageError::DiskNotDir));
        assert_eq!(set.online_count(), 3);

        // Formatting requires every disk.
        let err = assert_err!(format_disks(&disks.paths, &config()).await);
        assert!(matches!(err, XlError::DiskUnavailable { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_build_reordered_disks() {
        let disks = new_disks(4);
        assert_ok!(format_disks(&disks.paths, &config()).await);

        let mut reordered = disks.paths.clone();
        reordered.swap(0, 1);
        reordered.swap(2, 3);
        let err = assert_err!(new_xl_objects(&reordered, &[], &config()).await);
        assert_eq!(
            err,
            XlError::FormatMismatch(MismatchReason::SlotIndex {
                expected: 0,
                found: 1
            })
        );
    }

    #[tokio::test]
    async fn test_format_invalid_parity() {
        let disks = new_disks(4);
        let config = XlConfig {
            parity: Some(4),
            probe_timeout: Duration::from_secs(5),
        };
        let err = assert_err!(format_disks(&disks.paths, &config).await);
        assert!(matches!(err, XlError::InvalidArgument(_)));
    }
}
