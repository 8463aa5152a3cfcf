//! # Argus DAQ
//!
//! Reader for the shared-memory data interface published by Argus Monitor,
//! a hardware monitoring application that writes temperatures, fan speeds,
//! clocks, loads and power readings into a named memory mapping guarded by a
//! named mutex.
//!
//! ## Crate Structure
//!
//! - **`binary`**: little-endian cursor used by the decoders.
//! - **`sensors`**: the [`SensorType`] enumeration and its naming table.
//! - **`measurement`** / **`sample`**: wire-format decoding of one record and
//!   of a full sample with its per-type index tables.
//! - **`region`**: the [`SharedRegion`] seam with the live [`NamedRegion`] and
//!   the file-backed [`ReplayRegion`].
//! - **`client`**: [`ArgusClient`], the attach/read/detach handle.
//! - **`cached`** / **`watcher`**: change-driven reads keyed on the producer's
//!   cycle counter.
//! - **`config`**: Figment-based configuration.
//! - **`mock`**: an in-process producer for tests and demos.
//!
//! ## Example
//!
//! ```no_run
//! use argus_daq::{ArgusClient, SensorType};
//!
//! let client = ArgusClient::attach()?;
//! let sample = client.read()?;
//! for m in sample.measurements(SensorType::GpuTemperature)? {
//!     println!("{m}");
//! }
//! client.detach()?;
//! # Ok::<(), argus_daq::ArgusError>(())
//! ```

pub mod binary;
pub mod cached;
pub mod client;
pub mod config;
pub mod error;
pub mod measurement;
pub mod mock;
pub mod region;
pub mod sample;
pub mod sensors;
pub mod watcher;

pub use cached::CachedReader;
pub use client::ArgusClient;
pub use config::{ArgusConfig, RegionConfig, WatchConfig};
pub use error::{ArgusError, Result};
pub use measurement::Measurement;
pub use region::{NamedRegion, ReplayRegion, SharedRegion};
pub use sample::{Sample, Version};
pub use sensors::SensorType;
pub use watcher::Watcher;
