//! # Reel Configuration
//!
//! A flat string key/value store. Keys are dotted (`http.port`,
//! `store.chunk_size`); values are parsed at the point of use.
//!
//! ```rust
//! use reel_core::ReelConfig;
//! let mut config = ReelConfig::new();
//!
//! config.set("http.port", "3030");
//! config.set("store.backend", "fs");
//!
//! assert_eq!(config.get("http.port"), Some("3030"));
//! assert_eq!(config.get_parsed::<u16>("http.port"), Some(3030));
//! ```
//!
//! ## Environment overrides
//!
//! `load_env` maps prefixed variables onto keys, so with prefix `REEL__`:
//!
//! ```bash
//! export REEL__STORE__CHUNK_SIZE=1048576   # -> store.chunk_size
//! ```

use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Default, Clone)]
pub struct ReelConfig {
    values: HashMap<String, String>,
}

impl ReelConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a key only if it has no value yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Get and parse a value. Unparseable values read as absent.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse::<T>().ok())
    }

    /// Get and parse a value, falling back to `default`.
    pub fn get_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get_parsed(key).unwrap_or(default)
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overlay variables of the form `PREFIX__A__B=value` as key `a.b`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Same as [`ReelConfig::load_env`] over an explicit variable list.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                if !normalized.is_empty() {
                    self.set(normalized, value);
                }
            }
        }
    }
}
