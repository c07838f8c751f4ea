use std::time::Duration;

use super::*;

/// Test disk that wraps a real backend and misbehaves on request.
pub struct NaughtyDisk {
    inner: XlStorage,
    delay: Option<Duration>,
    fault: Option<StorageError>,
}

impl NaughtyDisk {
    pub fn new(inner: XlStorage) -> Self {
        NaughtyDisk {
            inner,
            delay: None,
            fault: None,
        }
    }

    /// Every call sleeps for `delay` first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call fails with `fault`.
    pub fn with_fault(mut self, fault: StorageError) -> Self {
        self.fault = Some(fault);
        self
    }

    async fn misbehave(&self) -> Result<(), StorageError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.inner.endpoint()
    }

    pub fn get_disk_id(&self) -> &str {
        self.inner.get_disk_id()
    }

    pub fn set_disk_id(&mut self, id: String) {
        self.inner.set_disk_id(id)
    }

    pub fn disk_index(&self) -> Option<usize> {
        self.inner.disk_index()
    }

    pub fn set_disk_index(&mut self, index: usize) {
        self.inner.set_disk_index(index)
    }

    pub async fn disk_info(&self) -> Result<DiskInfo, StorageError> {
        self.misbehave().await?;
        self.inner.disk_info().await
    }

    pub async fn make_volume(&self, volume: &str) -> Result<(), StorageError> {
        self.misbehave().await?;
        self.inner.make_volume(volume).await
    }

    pub async fn read_all(&self, volume: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        self.misbehave().await?;
        self.inner.read_all(volume, path).await
    }

    pub async fn write_all(&self, volume: &str, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.misbehave().await?;
        self.inner.write_all(volume, path, data).await
    }
}
