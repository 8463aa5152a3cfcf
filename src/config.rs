//! Configuration using Figment
//!
//! Configuration is layered, later sources winning:
//! 1. Built-in defaults (the real Argus Monitor object names)
//! 2. A TOML file (`argus.toml` unless a path is given)
//! 3. Environment variables prefixed with `ARGUS_`, nested with `__`
//!
//! # Example
//! ```no_run
//! use argus_daq::ArgusConfig;
//!
//! // ARGUS_WATCH__INTERVAL_MS=250 overrides [watch] interval_ms
//! let config = ArgusConfig::load()?;
//! config.validate()?;
//! # Ok::<(), argus_daq::ArgusError>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ArgusError, Result};
use crate::region::{MAPPING_NAME, MAPPING_SIZE, MUTEX_NAME};
use crate::sample::SAMPLE_BUFFER_SIZE;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "argus.toml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgusConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Shared memory object names
    #[serde(default)]
    pub region: RegionConfig,
    /// Background watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Names and size of the producer's shared objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Name of the file mapping object
    #[serde(default = "default_mapping_name")]
    pub mapping_name: String,
    /// Name of the mutex guarding the mapping
    #[serde(default = "default_mutex_name")]
    pub mutex_name: String,
    /// Bytes to map; must hold a full sample
    #[serde(default = "default_mapping_size")]
    pub mapping_size: usize,
}

/// Watcher polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Poll interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Samples buffered between the watcher and its consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_mapping_name() -> String {
    MAPPING_NAME.to_string()
}

fn default_mutex_name() -> String {
    MUTEX_NAME.to_string()
}

fn default_mapping_size() -> usize {
    MAPPING_SIZE
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_channel_capacity() -> usize {
    1
}

impl Default for ArgusConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            region: RegionConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            mapping_name: default_mapping_name(),
            mutex_name: default_mutex_name(),
            mapping_size: default_mapping_size(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl WatchConfig {
    /// Watch at `interval` with the default channel capacity.
    ///
    /// Sub-millisecond intervals round up to 1 ms.
    pub fn with_interval(interval: Duration) -> Self {
        let ms = interval.as_nanos().div_ceil(1_000_000).max(1);
        Self {
            interval_ms: ms.try_into().unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    /// Poll interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Reject a zero interval or channel capacity.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(ArgusError::Config {
                message: "watch.interval_ms must be greater than 0".to_string(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(ArgusError::Config {
                message: "watch.channel_capacity must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

impl ArgusConfig {
    /// Load from `argus.toml` in the working directory and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file path. A missing file contributes nothing.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ARGUS_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(ArgusError::Config { message });

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return invalid(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }

        if self.region.mapping_name.is_empty() || self.region.mutex_name.is_empty() {
            return invalid("mapping_name and mutex_name must not be empty".to_string());
        }

        if self.region.mapping_size < SAMPLE_BUFFER_SIZE {
            return invalid(format!(
                "mapping_size {} is smaller than one sample ({} bytes)",
                self.region.mapping_size, SAMPLE_BUFFER_SIZE
            ));
        }

        self.watch.validate()
    }
}
