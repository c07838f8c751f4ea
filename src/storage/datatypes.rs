use serde::Serialize;

/// Capacity and identity of one disk as reported by its backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiskInfo {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub endpoint: String,
    pub mount_path: String,
    pub id: String,
}
