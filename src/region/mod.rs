//! Access to the memory region the producer publishes samples into.
//!
//! [`SharedRegion`] is the seam between the decoding pipeline and the
//! operating system. It offers exactly two ways to look at the bytes:
//!
//! - [`SharedRegion::peek_u32`]: an unsynchronized, non-blocking read of one
//!   field. A torn read is tolerated; callers only use it to decide whether a
//!   full read is worthwhile.
//! - [`SharedRegion::with_lock`]: the authoritative path. Holds the
//!   cross-process lock (waiting without timeout) while the closure runs.
//!
//! Implementations:
//!
//! - [`NamedRegion`] - Argus Monitor's named mapping and mutex (Windows)
//! - [`ReplayRegion`] - a captured dump file, for offline decoding
//! - [`MemoryRegion`](crate::mock::MemoryRegion) - in-process producer for tests

pub mod named;
pub mod replay;

pub use named::{NamedRegion, MAPPING_NAME, MAPPING_SIZE, MUTEX_NAME};
pub use replay::ReplayRegion;

use crate::error::Result;

/// A mapped producer region plus the lock guarding it.
pub trait SharedRegion: Send + Sync {
    /// Human-readable identity for logs (mapping name or file path).
    fn describe(&self) -> String;

    /// Number of readable bytes.
    fn size(&self) -> usize;

    /// Read a little-endian `u32` at `offset` without taking the lock.
    ///
    /// Returns 0 if the field lies outside the region.
    fn peek_u32(&self, offset: usize) -> u32;

    /// Run `f` over the region bytes while holding the cross-process lock.
    ///
    /// Blocks until the lock is available. Fails with
    /// [`ArgusError::Sync`](crate::ArgusError::Sync) if the lock cannot be
    /// acquired or released.
    fn with_lock<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> T;

    /// Release every resource. Idempotent.
    ///
    /// All releases are attempted; the first error is returned.
    fn detach(&mut self) -> Result<()>;
}
