//! Error types for Argus shared-memory operations.
//!
//! Every failure mode of the acquisition pipeline maps onto one [`ArgusError`]
//! variant. Payloads are plain strings so the error is `Clone`, which lets a
//! [`Watcher`](crate::Watcher) hand out its terminal error more than once.

use thiserror::Error;

/// Result type alias for Argus operations.
pub type Result<T> = std::result::Result<T, ArgusError>;

/// Errors that can occur while attaching to, reading from, or decoding the
/// Argus Monitor shared memory interface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgusError {
    /// The mapping, its view, or the mutex could not be opened.
    ///
    /// Usually means Argus Monitor is not running, or the process lacks
    /// access to the `Global\` namespace.
    #[error("Failed to attach {resource} '{name}': {message}")]
    Attach {
        /// Which object failed: "mapping", "view" or "mutex".
        resource: &'static str,
        /// Object name that was requested.
        name: String,
        /// OS error text.
        message: String,
    },

    /// Waiting on or releasing the cross-process mutex failed.
    #[error("Mutex {operation} failed: {message}")]
    Sync {
        /// "wait" or "release".
        operation: &'static str,
        /// OS error text or wait result.
        message: String,
    },

    /// The buffer ended before a field could be read.
    #[error("Truncated sample: need {needed} bytes at offset {offset}, buffer has {available}")]
    DecodeTruncation {
        /// Cursor position of the failed read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Total buffer length.
        available: usize,
    },

    /// The producer's offset/count tables point outside the decoded data.
    #[error(
        "Sensor type {sensor_type} spans {offset}..{offset}+{count} but only {len} measurements were decoded"
    )]
    IndexOutOfRange {
        /// Name of the queried sensor type.
        sensor_type: String,
        /// Table offset for that type.
        offset: u32,
        /// Table count for that type.
        count: u32,
        /// Number of decoded measurements.
        len: usize,
    },

    /// I/O error while accessing a replay dump.
    #[error("I/O error: {message}")]
    Io {
        /// Path and OS error text.
        message: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    Config {
        /// What was rejected.
        message: String,
    },

    /// The watcher's background read could not complete.
    #[error("Watcher error: {message}")]
    Watcher {
        /// Join error text of the failed task.
        message: String,
    },
}

impl ArgusError {
    pub(crate) fn attach(resource: &'static str, name: &str, err: impl std::fmt::Display) -> Self {
        Self::Attach {
            resource,
            name: name.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn sync(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Sync {
            operation,
            message: err.to_string(),
        }
    }

    /// Check if this is an attach failure (producer likely not running).
    pub fn is_attach(&self) -> bool {
        matches!(self, Self::Attach { .. })
    }

    /// Check if this is a synchronization failure.
    pub fn is_sync(&self) -> bool {
        matches!(self, Self::Sync { .. })
    }
}

impl From<std::io::Error> for ArgusError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<figment::Error> for ArgusError {
    fn from(err: figment::Error) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}
