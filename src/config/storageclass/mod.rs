use anyhow::{anyhow, bail};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::config::{check_valid_keys, KV, KVS, STORAGE_CLASS_SUB_SYS};

pub const CLASS_STANDARD: &str = "standard";

// Standard storage class environment variable
pub const STANDARD_ENV: &str = "HULK_STORAGE_CLASS_STANDARD";

// Supported storage class scheme is EC
const SCHEME_PREFIX: &str = "EC";

lazy_static! {
    // An empty value selects half of the disks for parity.
    pub static ref DEFAULT_KVS: KVS = KVS(vec![KV {
        key: CLASS_STANDARD.to_owned(),
        value: "".to_owned(),
    }]);
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StorageClass {
    pub parity: usize,
}

impl std::fmt::Display for StorageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", SCHEME_PREFIX, self.parity)
    }
}

impl std::str::FromStr for StorageClass {
    type Err = anyhow::Error;

    // Parses "EC:<parity>".
    fn from_str(s: &str) -> anyhow::Result<StorageClass> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            bail!("invalid storage class '{}', expected EC:<parity>", s);
        }
        if parts[0] != SCHEME_PREFIX {
            bail!("unsupported scheme '{}', supported scheme is EC", parts[0]);
        }
        let parity = parts[1]
            .parse::<usize>()
            .map_err(|e| anyhow!("invalid parity '{}': {}", parts[1], e))?;
        Ok(StorageClass { parity })
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub standard: Option<StorageClass>,
}

pub fn lookup_config(kvs: &KVS) -> anyhow::Result<Config> {
    check_valid_keys(STORAGE_CLASS_SUB_SYS, kvs, &DEFAULT_KVS)?;

    let standard = kvs.env_or_get(STANDARD_ENV, CLASS_STANDARD);
    let standard = if standard.is_empty() {
        None
    } else {
        let sc = standard
            .parse::<StorageClass>()
            .map_err(|e| anyhow!("storage class 'standard' value invalid: {}", e))?;
        Some(sc)
    };
    Ok(Config { standard })
}
