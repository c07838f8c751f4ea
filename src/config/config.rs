use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

pub const COMMON_KEY: &str = "comment";

// Top level config constants.
pub const STORAGE_CLASS_SUB_SYS: &str = "storage_class";
pub const DRIVE_SUB_SYS: &str = "drive";
// Add new constants here if you add new fields to config.

// Constant separators
pub const KV_SEPARATOR: &str = "=";
pub const KV_SPACE_SEPARATOR: &str = " ";
pub const KV_DOUBLE_QUOTE: &str = "\"";
pub const KV_SINGLE_QUOTE: &str = "'";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KV {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KVS(pub Vec<KV>);

impl KVS {
    pub fn iter(&self) -> std::slice::Iter<'_, KV> {
        self.0.iter()
    }

    // Sets a key value pair.
    pub fn set(&mut self, key: String, value: String) {
        match self.0.iter_mut().find(|kv| kv.key == key) {
            Some(kv) => {
                kv.value = value;
            }
            None => self.0.push(KV { key, value }),
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.lookup(key).unwrap_or("")
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|&kv| kv.key == key)
            .map(|kv| kv.value.as_str())
    }

    /// Returns the value of `env` if set, else the value stored under `key`.
    pub fn env_or_get(&self, env: &str, key: &str) -> String {
        std::env::var(env).unwrap_or_else(|_| self.get(key).to_owned())
    }
}

impl ToString for KVS {
    fn to_string(&self) -> String {
        let mut s = String::new();
        for kv in &self.0 {
            s.push_str(&kv.key);
            s.push_str(KV_SEPARATOR);
            let spc = kv.value.contains(char::is_whitespace);
            if spc {
                s.push_str(KV_DOUBLE_QUOTE);
            }
            s.push_str(&kv.value);
            if spc {
                s.push_str(KV_DOUBLE_QUOTE);
            }
            s.push_str(KV_SPACE_SEPARATOR);
        }
        s.trim_end().to_owned()
    }
}

impl FromStr for KVS {
    type Err = anyhow::Error;

    // Parses `key=value` pairs separated by spaces; values may be quoted.
    fn from_str(s: &str) -> anyhow::Result<KVS> {
        let mut kvs = KVS::default();
        let mut prev_k = ""; // previous key
        for f in kv_fields(s) {
            let kv: Vec<&str> = f.splitn(2, KV_SEPARATOR).collect();
            if kv.len() == 1 && !prev_k.is_empty() {
                // Merge previous value and this value.
                let v = [kvs.get(prev_k), sanitize_value(kv[0])].join(KV_SPACE_SEPARATOR);
                kvs.set(prev_k.to_owned(), v);
            } else if kv.len() == 2 && !kv[0].is_empty() {
                prev_k = kv[0]; // remember this key
                kvs.set(prev_k.to_owned(), sanitize_value(kv[1]).to_owned());
            } else {
                bail!("invalid key value pair '{}'", f);
            }
        }
        Ok(kvs)
    }
}

fn kv_fields(input: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if start < i {
                    fields.push(&input[start..i]);
                }
                start = i + c.len_utf8();
            }
            None => {}
        }
    }
    if start < input.len() {
        fields.push(&input[start..]);
    }
    fields
}

// Trim off whitespaces, single or double quotes, creeping into the values.
fn sanitize_value(v: &str) -> &str {
    let quotes = KV_DOUBLE_QUOTE
        .chars()
        .chain(KV_SINGLE_QUOTE.chars())
        .collect::<Vec<char>>();
    v.trim().trim_matches(&quotes[..])
}

/// Rejects keys of `kvs` that `valid_kvs` does not define for `sub_sys`.
pub fn check_valid_keys(sub_sys: &str, kvs: &KVS, valid_kvs: &KVS) -> anyhow::Result<()> {
    let invalid: Vec<&str> = kvs
        .iter()
        .filter(|kv| kv.key != COMMON_KEY && valid_kvs.lookup(&kv.key).is_none())
        .map(|kv| kv.key.as_str())
        .collect();
    if !invalid.is_empty() {
        bail!(
            "found invalid keys ({}) for '{}' sub-system, use 'hulk-xl --help' to list valid keys",
            invalid.join(","),
            sub_sys
        );
    }
    Ok(())
}
