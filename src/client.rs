//! Client handle over an attached Argus region.
//!
//! [`ArgusClient`] owns a [`SharedRegion`] and exposes the three read paths:
//!
//! - [`ArgusClient::cycle_counter`]: lock-free peek at the producer's counter
//! - [`ArgusClient::read`]: full decode under the cross-process lock
//! - [`ArgusClient::cached`] / [`ArgusClient::watch`]: change-driven reads
//!   built on the two above
//!
//! Full reads on one client are serialized: concurrent callers queue on an
//! in-process mutex before touching the cross-process one.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cached::CachedReader;
use crate::config::{RegionConfig, WatchConfig};
use crate::error::Result;
use crate::region::{NamedRegion, ReplayRegion, SharedRegion};
use crate::sample::{Sample, CYCLE_COUNTER_OFFSET, SAMPLE_BUFFER_SIZE};
use crate::watcher::Watcher;

/// Connection to the producer's shared memory.
///
/// Detaches on drop; use [`ArgusClient::detach`] to observe release errors.
#[derive(Debug)]
pub struct ArgusClient<R: SharedRegion = NamedRegion> {
    region: R,
    read_lock: Mutex<()>,
    detached: bool,
}

impl ArgusClient<NamedRegion> {
    /// Attach to the running Argus Monitor instance.
    ///
    /// # Errors
    ///
    /// [`ArgusError::Attach`](crate::ArgusError::Attach) if the mapping,
    /// view or mutex cannot be opened, typically because Argus Monitor is
    /// not running.
    pub fn attach() -> Result<Self> {
        Self::attach_with(&RegionConfig::default())
    }

    /// Attach using non-default object names.
    pub fn attach_with(config: &RegionConfig) -> Result<Self> {
        NamedRegion::attach(config).map(Self::new)
    }
}

impl ArgusClient<ReplayRegion> {
    /// Open a captured dump instead of the live mapping.
    pub fn replay(path: impl AsRef<Path>) -> Result<Self> {
        ReplayRegion::open(path).map(Self::new)
    }
}

impl<R: SharedRegion> ArgusClient<R> {
    /// Wrap an already attached region.
    pub fn new(region: R) -> Self {
        Self {
            region,
            read_lock: Mutex::new(()),
            detached: false,
        }
    }

    /// The underlying region.
    pub fn region(&self) -> &R {
        &self.region
    }

    /// Current producer cycle counter, read without locking.
    ///
    /// Never blocks. The value may be torn or stale; it only tells whether a
    /// full [`read`](Self::read) is likely to see new data.
    pub fn cycle_counter(&self) -> u32 {
        self.region.peek_u32(CYCLE_COUNTER_OFFSET)
    }

    /// Decode a consistent sample while holding the producer's mutex.
    ///
    /// The lock is released before this returns, even when decoding fails.
    pub fn read(&self) -> Result<Sample> {
        let _serial = self.read_lock.lock();
        let sample = self.region.with_lock(Sample::decode)??;
        debug!(
            cycle = sample.cycle_counter,
            measurements = sample.data.len(),
            "Read Argus sample"
        );
        Ok(sample)
    }

    /// Copy the raw sample bytes under the mutex, for replay or debugging.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let _serial = self.read_lock.lock();
        self.region
            .with_lock(|bytes| bytes[..bytes.len().min(SAMPLE_BUFFER_SIZE)].to_vec())
    }

    /// Reader that only decodes when the cycle counter moves.
    pub fn cached(&self) -> CachedReader<'_, R> {
        CachedReader::new(self)
    }

    /// Release the view, the mapping and the mutex handle.
    pub fn detach(mut self) -> Result<()> {
        self.detached = true;
        info!(region = %self.region.describe(), "Detaching from Argus shared memory");
        self.region.detach()
    }
}

impl<R: SharedRegion + 'static> ArgusClient<R> {
    /// Poll for new samples in the background.
    ///
    /// Must be called within a Tokio runtime.
    pub fn watch(self: Arc<Self>, interval: Duration) -> Watcher {
        Watcher::spawn(self, &WatchConfig::with_interval(interval))
    }

    /// Like [`watch`](Self::watch) with an explicit channel capacity.
    pub fn watch_with(self: Arc<Self>, config: &WatchConfig) -> Watcher {
        Watcher::spawn(self, config)
    }
}

impl<R: SharedRegion> Drop for ArgusClient<R> {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Err(e) = self.region.detach() {
            warn!(error = %e, "Failed to detach Argus region on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemoryRegion, SampleBuilder};
    use crate::ArgusError;

    #[test]
    fn test_peek_does_not_lock() {
        let (region, producer) = MemoryRegion::new();
        producer.publish(&SampleBuilder::new().cycle_counter(5).build());

        let client = ArgusClient::new(region);
        assert_eq!(client.cycle_counter(), 5);
        producer.set_cycle_counter(6);
        assert_eq!(client.cycle_counter(), 6);
        assert_eq!(producer.lock_count(), 0);
    }

    #[test]
    fn test_read_takes_lock_once() {
        let (region, producer) = MemoryRegion::new();
        producer.publish(&SampleBuilder::new().cycle_counter(10).build());

        let client = ArgusClient::new(region);
        let sample = client.read().unwrap();
        assert_eq!(sample.cycle_counter, 10);
        assert_eq!(producer.lock_count(), 1);
    }

    #[test]
    fn test_lock_failure_is_sync_error() {
        let (region, producer) = MemoryRegion::new();
        producer.set_fail_locks(true);

        let client = ArgusClient::new(region);
        assert!(client.read().unwrap_err().is_sync());
        assert!(client.snapshot().unwrap_err().is_sync());
    }

    #[test]
    fn test_read_recovers_after_sync_failure() {
        let (region, producer) = MemoryRegion::new();
        // Declares more records than the region holds.
        producer.publish(&SampleBuilder::new().total_measurement_count(100_000).build());

        let client = ArgusClient::new(region);
        let sample = client.read().unwrap();
        assert_eq!(sample.data.len(), crate::sample::SENSOR_DATA_CAPACITY);

        producer.set_fail_locks(true);
        assert!(matches!(client.read(), Err(ArgusError::Sync { .. })));
        producer.set_fail_locks(false);
        assert!(client.read().is_ok());
    }

    #[test]
    fn test_snapshot_is_sample_sized() {
        let (region, producer) = MemoryRegion::new();
        let bytes = SampleBuilder::new().cycle_counter(1).build();
        producer.publish(&bytes);

        let client = ArgusClient::new(region);
        let snapshot = client.snapshot().unwrap();
        assert_eq!(snapshot.len(), SAMPLE_BUFFER_SIZE);
        assert_eq!(&snapshot[..bytes.len()], &bytes[..]);
    }

    #[test]
    fn test_detach_and_drop_release_region() {
        let (region, producer) = MemoryRegion::new();
        ArgusClient::new(region).detach().unwrap();
        assert!(producer.is_detached());

        let (region, producer) = MemoryRegion::new();
        drop(ArgusClient::new(region));
        assert!(producer.is_detached());
    }
}
