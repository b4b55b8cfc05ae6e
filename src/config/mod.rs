//! Engine configuration
//!
//! Defaults suit a process with tens of thousands of component types.
//! Values can come from JSON or from `LIFEMARK_*` environment variables:
//!
//! | Variable                               | Field                             |
//! |----------------------------------------|-----------------------------------|
//! | `LIFEMARK_METADATA_INITIAL_CAPACITY`   | `metadata_cache.initial_capacity` |
//! | `LIFEMARK_METADATA_MAX_CAPACITY`       | `metadata_cache.max_capacity`     |
//! | `LIFEMARK_METADATA_IDLE_SECS`          | `metadata_cache.time_to_idle_secs`|
//! | `LIFEMARK_HANDLE_INITIAL_CAPACITY`     | `handle_cache.initial_capacity`   |
//! | `LIFEMARK_BIND_POLICY`                 | `bind_policy`                     |
//! | `LIFEMARK_PRELOAD_THREADS`             | `preload_threads`                 |

use crate::error::{LifemarkError, Result};
use crate::invoke::{BindPolicy, DEFAULT_HANDLE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataCacheConfig {
    pub initial_capacity: usize,
    /// Upper bound on cached types; least useful entries are evicted first.
    pub max_capacity: u64,
    /// Drop entries not read for this long.
    pub time_to_idle_secs: Option<u64>,
}

impl Default for MetadataCacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 8192,
            max_capacity: 65_536,
            time_to_idle_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleCacheConfig {
    pub initial_capacity: usize,
}

impl Default for HandleCacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_HANDLE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub metadata_cache: MetadataCacheConfig,
    pub handle_cache: HandleCacheConfig,
    pub bind_policy: BindPolicy,
    /// Worker threads used by preload.
    pub preload_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metadata_cache: MetadataCacheConfig::default(),
            handle_cache: HandleCacheConfig::default(),
            bind_policy: BindPolicy::default(),
            preload_threads: num_cpus::get(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LifemarkError::Config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by whichever `LIFEMARK_*` variables are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let cache = &mut config.metadata_cache;

        if let Some(v) = parse(&lookup, "LIFEMARK_METADATA_INITIAL_CAPACITY")? {
            cache.initial_capacity = v;
        }
        if let Some(v) = parse(&lookup, "LIFEMARK_METADATA_MAX_CAPACITY")? {
            cache.max_capacity = v;
        }
        if let Some(v) = parse(&lookup, "LIFEMARK_METADATA_IDLE_SECS")? {
            cache.time_to_idle_secs = Some(v);
        }
        if let Some(v) = parse(&lookup, "LIFEMARK_HANDLE_INITIAL_CAPACITY")? {
            config.handle_cache.initial_capacity = v;
        }
        if let Some(v) = parse(&lookup, "LIFEMARK_BIND_POLICY")? {
            config.bind_policy = v;
        }
        if let Some(v) = parse(&lookup, "LIFEMARK_PRELOAD_THREADS")? {
            config.preload_threads = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.metadata_cache.max_capacity == 0 {
            return Err(LifemarkError::Config(
                "metadata_cache.max_capacity must be greater than zero".into(),
            ));
        }
        if self.metadata_cache.time_to_idle_secs == Some(0) {
            return Err(LifemarkError::Config(
                "metadata_cache.time_to_idle_secs must be greater than zero".into(),
            ));
        }
        if self.preload_threads == 0 {
            return Err(LifemarkError::Config(
                "preload_threads must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| LifemarkError::Config(format!("{key}={raw}: {e}")))
        })
        .transpose()
}
