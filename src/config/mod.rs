mod config;
pub mod drive;
pub mod storageclass;

pub use config::*;

use std::time::Duration;

use serde::Serialize;

use crate::globals::DEFAULT_DISK_PROBE_TIMEOUT;

/// Settings consumed when formatting disks and building erasure sets.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct XlConfig {
    /// Parity disks per set; `None` uses half of the set.
    pub parity: Option<usize>,
    pub probe_timeout: Duration,
}

impl Default for XlConfig {
    fn default() -> Self {
        XlConfig {
            parity: None,
            probe_timeout: DEFAULT_DISK_PROBE_TIMEOUT,
        }
    }
}

impl XlConfig {
    /// Reads the configuration from `HULK_*` environment variables.
    pub fn from_env() -> anyhow::Result<XlConfig> {
        XlConfig::lookup(&storageclass::DEFAULT_KVS, &drive::DEFAULT_KVS)
    }

    /// Reads the configuration from the given sub-system KVs, with
    /// environment variables taking precedence.
    pub fn lookup(storage_class: &KVS, drive: &KVS) -> anyhow::Result<XlConfig> {
        let storage_class = storageclass::lookup_config(storage_class)?;
        let drive = drive::lookup_config(drive)?;
        Ok(XlConfig {
            parity: storage_class.standard.map(|sc| sc.parity),
            probe_timeout: drive.probe_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::assert::*;

    #[test]
    fn test_default_config() {
        let config = XlConfig::default();
        assert_eq!(config.parity, None);
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_ok!(XlConfig::from_env());
    }
}
