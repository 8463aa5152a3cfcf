//! Read-only region backed by a captured dump file.
//!
//! A dump is the raw byte image of the shared region as written by
//! [`ArgusClient::snapshot`](crate::ArgusClient::snapshot). Replaying one lets
//! the decoder and the CLI run on machines without Argus Monitor.

#![allow(unsafe_code)]

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::SharedRegion;
use crate::error::{ArgusError, Result};

/// Memory-mapped dump file standing in for the live mapping.
#[derive(Debug)]
pub struct ReplayRegion {
    path: PathBuf,
    mmap: Option<Mmap>,
    lock: Mutex<()>,
}

impl ReplayRegion {
    /// Map `path` read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();

        let io_error = |e: std::io::Error| ArgusError::Io {
            message: format!("{name}: {e}"),
        };
        let file = File::open(&path).map_err(io_error)?;
        // SAFETY: the dump is opened read-only; external truncation while
        // mapped is outside our control, as with any mmap.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;

        info!(path = %name, size = mmap.len(), "Opened replay dump");

        Ok(Self {
            path,
            mmap: Some(mmap),
            lock: Mutex::new(()),
        })
    }

    /// Path of the dump file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SharedRegion for ReplayRegion {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn size(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }

    fn peek_u32(&self, offset: usize) -> u32 {
        self.mmap
            .as_ref()
            .and_then(|m| m.get(offset..offset.checked_add(4)?))
            .and_then(|b| b.try_into().ok())
            .map_or(0, u32::from_le_bytes)
    }

    fn with_lock<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> T,
    {
        let _guard = self.lock.lock();
        match &self.mmap {
            Some(mmap) => Ok(f(&mmap[..])),
            None => Err(ArgusError::sync("wait", "region is detached")),
        }
    }

    fn detach(&mut self) -> Result<()> {
        if self.mmap.take().is_some() {
            debug!(path = %self.path.display(), "Closed replay dump");
        }
        Ok(())
    }
}
