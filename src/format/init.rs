use std::time::Duration;

use futures_util::future::join_all;
use log::{info, warn};

use super::*;
use crate::errors::{
    count_err, reduce_quorum_errs, MismatchReason, StorageError, XlError, BASE_STORAGE_ERRORS,
};
use crate::storage::StorageApi;

/// Format status of one slot after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotFormat {
    /// Not probed, the slot is excluded from routing.
    Ignored,
    /// Carries the volume's format at the right position; holds the disk id.
    Consistent(String),
    /// Carries format metadata that does not fit the volume.
    Inconsistent(MismatchReason),
    /// Carries no format metadata at all.
    Unformatted,
    /// Could not be read.
    Faulty(StorageError),
}

impl SlotFormat {
    pub fn is_consistent(&self) -> bool {
        matches!(self, SlotFormat::Consistent(_))
    }
}

/// A volume format accepted by quorum, with the status of every slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFormat {
    pub format: FormatErasureV1,
    pub slots: Vec<SlotFormat>,
}

impl ValidatedFormat {
    pub fn consistent_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_consistent()).count()
    }
}

/// Decides whether the loaded formats describe one valid volume.
///
/// `formats` has one entry per slot; `None` marks ignored slots, which
/// neither count towards nor against `quorum`.
pub fn validate_format_erasure(
    formats: &[Option<Result<FormatErasureV1, StorageError>>],
    quorum: usize,
) -> Result<ValidatedFormat, XlError> {
    let set_drive_count = formats.len();

    // Group well-formed records by volume, keeping slot order for ties.
    let mut groups: Vec<(&FormatErasureV1, usize)> = Vec::new();
    for format in formats.iter().flatten().filter_map(|res| res.as_ref().ok()) {
        if format.check_values().is_err() {
            continue;
        }
        match groups.iter_mut().find(|(f, _)| f.same_volume(format)) {
            Some((_, count)) => *count += 1,
            None => groups.push((format, 1)),
        }
    }
    let mut reference: Option<(&FormatErasureV1, usize)> = None;
    for &(format, count) in &groups {
        if reference.map_or(true, |(_, max)| count > max) {
            reference = Some((format, count));
        }
    }
    if let Some((format, count)) = reference {
        // Two volumes each claiming quorum cannot be told apart.
        if count >= quorum
            && groups
                .iter()
                .any(|(f, c)| *c >= quorum && !f.same_volume(format))
        {
            let index = formats
                .iter()
                .position(|f| match f {
                    Some(Ok(other)) => other.check_values().is_ok() && !other.same_volume(format),
                    _ => false,
                })
                .unwrap_or(0);
            return Err(XlError::FormatMismatch(MismatchReason::VolumeId { index }));
        }
    }
    let reference = reference.map(|(format, _)| format);

    let slots: Vec<SlotFormat> = formats
        .iter()
        .enumerate()
        .map(|(index, format)| match format {
            None => SlotFormat::Ignored,
            Some(Err(StorageError::UnformattedDisk)) => SlotFormat::Unformatted,
            Some(Err(StorageError::CorruptedFormat)) => {
                SlotFormat::Inconsistent(MismatchReason::Corrupted { index })
            }
            Some(Err(err)) => SlotFormat::Faulty(err.clone()),
            Some(Ok(format)) => {
                if let Err(reason) = format.check_values() {
                    return SlotFormat::Inconsistent(reason);
                }
                // A well-formed record always yields a reference.
                let reference = reference.unwrap_or(format);
                if let Some(reason) = reference.volume_mismatch(format, index) {
                    return SlotFormat::Inconsistent(reason);
                }
                match format.check_position(index, set_drive_count) {
                    Ok(_) => SlotFormat::Consistent(format.erasure.this.clone()),
                    Err(reason) => SlotFormat::Inconsistent(reason),
                }
            }
        })
        .collect();

    let consistent = slots.iter().filter(|s| s.is_consistent()).count();
    if consistent >= quorum {
        if let Some(reference) = reference {
            return Ok(ValidatedFormat {
                format: reference.clone(),
                slots,
            });
        }
    }

    let errs: Vec<Option<StorageError>> = formats
        .iter()
        .flatten()
        .map(|res| res.as_ref().err().cloned())
        .collect();
    let unformatted = count_err(&errs, &StorageError::UnformattedDisk);
    let formatted = formats
        .iter()
        .flatten()
        .filter(|res| match res {
            Ok(_) => true,
            Err(err) => *err != StorageError::UnformattedDisk && !err.is_unreachable(),
        })
        .count();

    if let Ok(Some(StorageError::UnformattedDisk)) =
        reduce_quorum_errs(&errs, &BASE_STORAGE_ERRORS, quorum)
    {
        if formatted == 0 {
            return Err(XlError::NotFormatted);
        }
        return Err(XlError::FormatMismatch(
            MismatchReason::PartiallyFormatted {
                formatted,
                unformatted,
            },
        ));
    }
    // Too few disks probed to reach quorum, but none of them carries a format.
    if unformatted > 0 && unformatted == errs.len() {
        return Err(XlError::NotFormatted);
    }

    let inconsistent = slots
        .iter()
        .filter(|s| matches!(s, SlotFormat::Inconsistent(_)))
        .count();
    if inconsistent > 0 && consistent + inconsistent >= quorum {
        // The mismatching disks are what keeps the set below quorum.
        if let Some(SlotFormat::Inconsistent(reason)) = slots
            .iter()
            .find(|s| matches!(s, SlotFormat::Inconsistent(_)))
        {
            return Err(XlError::FormatMismatch(reason.clone()));
        }
    }

    Err(XlError::InsufficientQuorum {
        consistent,
        required: quorum,
    })
}

/// Writes a fresh format to every disk, or confirms an existing one.
///
/// All disks must be reachable. Either every disk is unformatted, in which
/// case a new volume is created, or every disk already carries the format
/// of one volume at its own position, in which case nothing is written.
/// Anything in between fails before any write happens.
pub async fn init_format_erasure(
    disks: &[StorageApi],
    timeout: Duration,
) -> Result<FormatErasureV1, XlError> {
    let set_drive_count = disks.len();
    let probes: Vec<Option<&StorageApi>> = disks.iter().map(Some).collect();
    let formats: Vec<Result<FormatErasureV1, StorageError>> =
        load_format_erasure_all(&probes, timeout)
            .await
            .into_iter()
            .map(|res| res.unwrap_or(Err(StorageError::DiskNotFound)))
            .collect();

    match check_init_formats(&formats)? {
        Some(existing) => {
            info!(
                "disks are already formatted as volume {}, nothing to do",
                existing.volume_id()
            );
            Ok(existing)
        }
        None => {
            let format = FormatErasureV1::new(set_drive_count);
            save_format_erasure_all(disks, &format, timeout).await?;
            info!(
                "formatted {} disks as volume {}",
                set_drive_count,
                format.volume_id()
            );
            Ok(format)
        }
    }
}

/// Returns the existing volume format when every disk already carries it,
/// `None` when every disk is unformatted, and an error otherwise.
pub fn check_init_formats(
    formats: &[Result<FormatErasureV1, StorageError>],
) -> Result<Option<FormatErasureV1>, XlError> {
    let set_drive_count = formats.len();

    // Unreachable disks are fatal before anything else is considered.
    for (index, res) in formats.iter().enumerate() {
        match res {
            Ok(_) | Err(StorageError::UnformattedDisk) => {}
            Err(StorageError::CorruptedFormat) => {
                return Err(XlError::FormatMismatch(MismatchReason::Corrupted { index }));
            }
            Err(err) => {
                return Err(XlError::DiskUnavailable {
                    index,
                    source: err.clone(),
                })
            }
        }
    }

    let mut reference: Option<&FormatErasureV1> = None;
    let mut formatted = 0;
    for (index, format) in formats.iter().enumerate() {
        let format = match format {
            Ok(format) => format,
            Err(_) => continue,
        };
        format.check_values().map_err(XlError::FormatMismatch)?;
        let reference = *reference.get_or_insert(format);
        if let Some(reason) = reference.volume_mismatch(format, index) {
            return Err(XlError::FormatMismatch(reason));
        }
        format
            .check_position(index, set_drive_count)
            .map_err(XlError::FormatMismatch)?;
        formatted += 1;
    }

    match reference {
        None => Ok(None),
        Some(reference) if formatted == set_drive_count => Ok(Some(reference.clone())),
        Some(_) => Err(XlError::FormatMismatch(MismatchReason::PartiallyFormatted {
            formatted,
            unformatted: set_drive_count - formatted,
        })),
    }
}

async fn save_format_erasure_all(
    disks: &[StorageApi],
    format: &FormatErasureV1,
    timeout: Duration,
) -> Result<(), XlError> {
    let futures = disks.iter().enumerate().map(|(index, disk)| async move {
        let format = match format.for_disk(index) {
            Some(format) => format,
            None => return Err(StorageError::Unexpected),
        };
        match tokio::time::timeout(timeout, save_format_erasure(disk, &format)).await {
            Ok(res) => res,
            Err(_) => Err(StorageError::DiskTimeout),
        }
    });
    for (index, res) in join_all(futures).await.into_iter().enumerate() {
        if let Err(err) = res {
            warn!(
                "unable to write format to disk {} ({}): {}",
                index,
                disks[index].endpoint(),
                err
            );
            return Err(XlError::DiskUnavailable { index, source: err });
        }
    }
    Ok(())
}
