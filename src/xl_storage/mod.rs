use std::path::{Path, PathBuf};

use log::debug;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::endpoint::Endpoint;
use crate::errors::StorageError;
use crate::fs::{check_path_length, reliable_mkdir_all, reliable_rename};
use crate::globals::SYSTEM_META_TMP_BUCKET;
use crate::storage::DiskInfo;

/// A disk backed by a local directory.
pub struct XlStorage {
    disk_path: PathBuf,
    endpoint: Endpoint,

    disk_id: String,

    // Position in the erasure set, `None` until assigned.
    disk_index: Option<usize>,
}

impl XlStorage {
    pub async fn new(endpoint: Endpoint) -> Result<Self, StorageError> {
        let disk_path = get_valid_path(endpoint.path()).await?;
        Ok(XlStorage {
            disk_path,
            endpoint,
            disk_id: "".to_owned(),
            disk_index: None,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn disk_path(&self) -> &Path {
        &self.disk_path
    }

    pub fn get_disk_id(&self) -> &str {
        &self.disk_id
    }

    pub fn set_disk_id(&mut self, id: String) {
        self.disk_id = id;
    }

    pub fn disk_index(&self) -> Option<usize> {
        self.disk_index
    }

    pub fn set_disk_index(&mut self, index: usize) {
        self.disk_index = Some(index);
    }

    pub async fn disk_info(&self) -> Result<DiskInfo, StorageError> {
        self.check_disk().await?;
        let info = crate::disk::get_info(&self.disk_path).await.map_err(|err| {
            debug!("disk usage of {} unavailable: {}", self.endpoint, err);
            StorageError::FaultyDisk
        })?;
        Ok(DiskInfo {
            total: info.total,
            free: info.free,
            used: info.used,
            endpoint: self.endpoint.to_string(),
            mount_path: self.disk_path.to_string_lossy().into_owned(),
            id: self.disk_id.clone(),
        })
    }

    pub async fn make_volume(&self, volume: &str) -> Result<(), StorageError> {
        let volume_dir = self.volume_dir(volume).await?;
        match fs::metadata(&volume_dir).await {
            Ok(_) => Err(StorageError::VolumeExists),
            Err(err) if crate::fs::err_not_found(&err) => {
                reliable_mkdir_all(&volume_dir, 0o777).await
            }
            Err(err) => Err(StorageError::from_io(err)),
        }
    }

    pub async fn read_all(&self, volume: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let volume_dir = self.existing_volume_dir(volume).await?;
        let file_path = volume_dir.join(path);
        check_path_length(&file_path.to_string_lossy())?;
        fs::read(&file_path).await.map_err(StorageError::from_io)
    }

    /// Writes `data` to a temporary file and renames it into place.
    pub async fn write_all(&self, volume: &str, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let volume_dir = self.existing_volume_dir(volume).await?;
        let file_path = volume_dir.join(path);
        check_path_length(&file_path.to_string_lossy())?;

        let tmp_dir = self.disk_path.join(SYSTEM_META_TMP_BUCKET);
        reliable_mkdir_all(&tmp_dir, 0o777).await?;
        let tmp_path = tmp_dir.join(uuid::Uuid::new_v4().to_string());

        let res = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = res {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::from_io(err));
        }

        if let Err(err) = reliable_rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        Ok(())
    }

    async fn check_disk(&self) -> Result<(), StorageError> {
        match fs::metadata(&self.disk_path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StorageError::DiskNotDir),
            Err(err) if crate::fs::err_not_found(&err) => Err(StorageError::DiskNotFound),
            Err(err) if crate::fs::err_permission(&err) => Err(StorageError::DiskAccessDenied),
            Err(err) => Err(StorageError::from_io(err)),
        }
    }

    async fn volume_dir(&self, volume: &str) -> Result<PathBuf, StorageError> {
        check_path_length(volume)?;
        self.check_disk().await?;
        Ok(self.disk_path.join(volume))
    }

    async fn existing_volume_dir(&self, volume: &str) -> Result<PathBuf, StorageError> {
        let volume_dir = self.volume_dir(volume).await?;
        match fs::metadata(&volume_dir).await {
            Ok(meta) if meta.is_dir() => Ok(volume_dir),
            Ok(_) => Err(StorageError::VolumeNotFound),
            Err(err) if crate::fs::err_not_found(&err) => Err(StorageError::VolumeNotFound),
            Err(err) => Err(StorageError::from_io(err)),
        }
    }
}

/// Validates a disk path, creating the directory when it does not exist yet.
pub async fn get_valid_path(path: &str) -> Result<PathBuf, StorageError> {
    if path.is_empty() {
        return Err(StorageError::DiskNotFound);
    }

    use path_absolutize::Absolutize;
    let path = Path::new(path)
        .absolutize()
        .map_err(StorageError::from_io)?
        .into_owned();

    match fs::metadata(&path).await {
        Err(err) => {
            if !crate::fs::err_not_found(&err) {
                return Err(StorageError::from_io(err));
            }
            // Path not found, create it.
            reliable_mkdir_all(&path, 0o777).await?;
        }
        Ok(meta) => {
            if !meta.is_dir() {
                return Err(StorageError::DiskNotDir);
            }
        }
    }

    Ok(path)
}
