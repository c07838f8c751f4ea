use std::path::Path;

/// Capacity figures of the filesystem backing a disk path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Info {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

pub async fn get_info<P: AsRef<Path>>(path: P) -> anyhow::Result<Info> {
    let disk_usage = heim::disk::usage(path.as_ref()).await?;

    let total = disk_usage.total().get::<heim::units::information::byte>();
    let free = disk_usage.free().get::<heim::units::information::byte>();
    Ok(Info {
        total,
        // Reserved blocks can make the reported free space exceed what is usable.
        free: free.min(total),
        used: disk_usage.used().get::<heim::units::information::byte>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_info() {
        let dir = tempfile::tempdir().unwrap();
        let info = get_info(dir.path()).await.unwrap();
        assert!(info.total > 0);
        assert!(info.free <= info.total);
    }

    #[tokio::test]
    async fn test_get_info_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(get_info(dir.path().join("missing")).await.is_err());
    }
}
