use std::time::Duration;

use anyhow::{anyhow, bail};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::config::{check_valid_keys, DRIVE_SUB_SYS, KV, KVS};

pub const PROBE_TIMEOUT: &str = "probe_timeout";

pub const ENV_PROBE_TIMEOUT: &str = "HULK_DRIVE_PROBE_TIMEOUT";

lazy_static! {
    pub static ref DEFAULT_KVS: KVS = KVS(vec![KV {
        key: PROBE_TIMEOUT.to_owned(),
        value: "10s".to_owned(),
    }]);
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Upper bound for any single call to a disk while probing it.
    pub probe_timeout: Duration,
}

pub fn lookup_config(kvs: &KVS) -> anyhow::Result<Config> {
    check_valid_keys(DRIVE_SUB_SYS, kvs, &DEFAULT_KVS)?;

    let probe_timeout = kvs.env_or_get(ENV_PROBE_TIMEOUT, PROBE_TIMEOUT);
    let probe_timeout = humantime::parse_duration(&probe_timeout)
        .map_err(|e| anyhow!("drive 'probe_timeout' value invalid: {}", e))?;
    if probe_timeout == Duration::from_secs(0) {
        bail!("drive 'probe_timeout' must be greater than zero");
    }
    Ok(Config { probe_timeout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::assert::*;

    // Only this test touches the environment variable.
    #[test]
    fn test_lookup_config() {
        std::env::remove_var(ENV_PROBE_TIMEOUT);
        let config = assert_ok!(lookup_config(&DEFAULT_KVS));
        assert_eq!(config.probe_timeout, Duration::from_secs(10));

        let kvs: KVS = assert_ok!("probe_timeout=1m30s".parse());
        let config = assert_ok!(lookup_config(&kvs));
        assert_eq!(config.probe_timeout, Duration::from_secs(90));

        let kvs: KVS = assert_ok!("probe_timeout=0s".parse());
        assert_err!(lookup_config(&kvs));
        let kvs: KVS = assert_ok!("probe_timeout=soon".parse());
        assert_err!(lookup_config(&kvs));

        std::env::set_var(ENV_PROBE_TIMEOUT, "250ms");
        let config = lookup_config(&DEFAULT_KVS);
        std::env::remove_var(ENV_PROBE_TIMEOUT);
        assert_eq!(assert_ok!(config).probe_timeout, Duration::from_millis(250));
    }
}
