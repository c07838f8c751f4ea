mod datatypes;
#[cfg(test)]
mod naughty;

pub use datatypes::*;
#[cfg(test)]
pub use naughty::*;

use crate::endpoint::Endpoint;
use crate::errors::StorageError;
use crate::xl_storage::XlStorage;

/// A single disk as seen by the erasure layer.
pub enum StorageApi {
    XlStorage(XlStorage),
    #[cfg(test)]
    Naughty(NaughtyDisk),
}

impl StorageApi {
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            StorageApi::XlStorage(inner) => inner.endpoint(),
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.endpoint(),
        }
    }

    pub fn get_disk_id(&self) -> &str {
        match self {
            StorageApi::XlStorage(inner) => inner.get_disk_id(),
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.get_disk_id(),
        }
    }

    pub fn set_disk_id(&mut self, id: String) {
        match self {
            StorageApi::XlStorage(inner) => inner.set_disk_id(id),
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.set_disk_id(id),
        }
    }

    pub fn disk_index(&self) -> Option<usize> {
        match self {
            StorageApi::XlStorage(inner) => inner.disk_index(),
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.disk_index(),
        }
    }

    pub fn set_disk_index(&mut self, index: usize) {
        match self {
            StorageApi::XlStorage(inner) => inner.set_disk_index(index),
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.set_disk_index(index),
        }
    }

    pub async fn disk_info(&self) -> Result<DiskInfo, StorageError> {
        match self {
            StorageApi::XlStorage(inner) => inner.disk_info().await,
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.disk_info().await,
        }
    }

    pub async fn make_volume(&self, volume: &str) -> Result<(), StorageError> {
        match self {
            StorageApi::XlStorage(inner) => inner.make_volume(volume).await,
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.make_volume(volume).await,
        }
    }

    pub async fn read_all(&self, volume: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            StorageApi::XlStorage(inner) => inner.read_all(volume, path).await,
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.read_all(volume, path).await,
        }
    }

    pub async fn write_all(&self, volume: &str, path: &str, data: &[u8]) -> Result<(), StorageError> {
        match self {
            StorageApi::XlStorage(inner) => inner.write_all(volume, path, data).await,
            #[cfg(test)]
            StorageApi::Naughty(inner) => inner.write_all(volume, path, data).await,
        }
    }
}

impl From<XlStorage> for StorageApi {
    fn from(storage: XlStorage) -> Self {
        StorageApi::XlStorage(storage)
    }
}

/// Opens the local backend for `endpoint`.
pub async fn new_storage_api(endpoint: Endpoint) -> Result<StorageApi, StorageError> {
    Ok(XlStorage::new(endpoint).await?.into())
}
