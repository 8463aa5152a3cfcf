//! Argus Monitor's named file mapping and its companion mutex.
//!
//! Attaching opens three OS objects in order: the mapping, a 1 MiB view of
//! it, and the mutex. If any step fails, everything acquired so far is
//! released before the error is returned.
//!
//! The producer only exists on Windows. On other platforms
//! [`NamedRegion::attach`] always fails with [`ArgusError::Attach`].

#![allow(unsafe_code)]

use tracing::{debug, info, warn};

use super::SharedRegion;
use crate::config::RegionConfig;
use crate::error::{ArgusError, Result};

/// Name of the file mapping published by Argus Monitor.
pub const MAPPING_NAME: &str = "Global\\ARGUSMONITOR_DATA_INTERFACE";

/// Name of the mutex guarding the mapping.
pub const MUTEX_NAME: &str = "Global\\ARGUSMONITOR_DATA_INTERFACE_MUTEX";

/// Size of the mapped view in bytes.
pub const MAPPING_SIZE: usize = 1024 * 1024;

/// Attached view of the producer's named mapping.
///
/// Dropping the region releases the view, the mapping handle, and the mutex
/// handle. Call [`SharedRegion::detach`] instead to observe release errors.
pub struct NamedRegion {
    objects: sys::Objects,
    mapping_name: String,
    size: usize,
}

impl NamedRegion {
    /// Open the mapping, map a view and open the mutex.
    pub fn attach(config: &RegionConfig) -> Result<Self> {
        debug!(
            mapping = %config.mapping_name,
            mutex = %config.mutex_name,
            size = config.mapping_size,
            "Attaching to Argus shared memory"
        );

        let objects = sys::Objects::open(
            &config.mapping_name,
            &config.mutex_name,
            config.mapping_size,
        )?;

        info!(mapping = %config.mapping_name, "Attached to Argus shared memory");

        Ok(Self {
            objects,
            mapping_name: config.mapping_name.clone(),
            size: config.mapping_size,
        })
    }
}

impl SharedRegion for NamedRegion {
    fn describe(&self) -> String {
        self.mapping_name.clone()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn peek_u32(&self, offset: usize) -> u32 {
        match offset.checked_add(4) {
            Some(end) if end <= self.size => self.objects.peek_u32(offset).unwrap_or(0),
            _ => 0,
        }
    }

    fn with_lock<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> T,
    {
        let guard = self.objects.lock()?;
        let out = f(guard.bytes());
        guard.release()?;
        Ok(out)
    }

    fn detach(&mut self) -> Result<()> {
        let result = self.objects.close();
        match &result {
            Ok(()) => debug!(mapping = %self.mapping_name, "Detached from Argus shared memory"),
            Err(e) => warn!(mapping = %self.mapping_name, error = %e, "Detach incomplete"),
        }
        result
    }
}

impl std::fmt::Debug for NamedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedRegion")
            .field("mapping_name", &self.mapping_name)
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(windows)]
mod sys {
    use std::ffi::OsStr;
    use std::io;
    use std::os::windows::ffi::OsStrExt;

    use tracing::warn;
    use windows_sys::Win32::Foundation::{
        CloseHandle, HANDLE, WAIT_ABANDONED, WAIT_OBJECT_0,
    };
    use windows_sys::Win32::System::Memory::{
        MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, FILE_MAP_READ, FILE_MAP_WRITE,
        MEMORY_MAPPED_VIEW_ADDRESS,
    };
    use windows_sys::Win32::System::Threading::{
        OpenMutexW, ReleaseMutex, WaitForSingleObject, INFINITE, MUTEX_MODIFY_STATE,
        SYNCHRONIZATION_SYNCHRONIZE,
    };

    use crate::error::{ArgusError, Result};

    fn wide(name: &str) -> Vec<u16> {
        OsStr::new(name).encode_wide().chain(Some(0)).collect()
    }

    /// Kernel handle closed on drop. A zero handle means "already closed".
    struct Handle(HANDLE);

    impl Handle {
        fn close(&mut self) -> io::Result<()> {
            if self.0 == 0 {
                return Ok(());
            }
            // SAFETY: handle is non-zero and owned by us; zeroed afterwards so
            // it is closed exactly once.
            let ok = unsafe { CloseHandle(self.0) };
            self.0 = 0;
            if ok == 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }

    impl Drop for Handle {
        fn drop(&mut self) {
            let _ = self.close();
        }
    }

    /// Mapped view unmapped on drop.
    struct View(*mut u8);

    impl View {
        fn unmap(&mut self) -> io::Result<()> {
            if self.0.is_null() {
                return Ok(());
            }
            let addr = MEMORY_MAPPED_VIEW_ADDRESS {
                Value: self.0.cast(),
            };
            // SAFETY: address came from MapViewOfFile and is nulled afterwards.
            let ok = unsafe { UnmapViewOfFile(addr) };
            self.0 = std::ptr::null_mut();
            if ok == 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }

    impl Drop for View {
        fn drop(&mut self) {
            let _ = self.unmap();
        }
    }

    /// View, mapping and mutex. Fields drop in declaration order.
    pub(super) struct Objects {
        view: View,
        mapping: Handle,
        mutex: Handle,
        size: usize,
    }

    // SAFETY: the view is only read through volatile loads or while holding
    // the producer mutex, and kernel handles are usable from any thread.
    unsafe impl Send for Objects {}
    unsafe impl Sync for Objects {}

    impl Objects {
        pub(super) fn open(mapping_name: &str, mutex_name: &str, size: usize) -> Result<Self> {
            let access = FILE_MAP_READ | FILE_MAP_WRITE;

            let name = wide(mapping_name);
            // SAFETY: `name` is a NUL-terminated UTF-16 buffer that outlives the call.
            let mapping = Handle(unsafe { OpenFileMappingW(access, 0, name.as_ptr()) });
            if mapping.0 == 0 {
                return Err(ArgusError::attach(
                    "mapping",
                    mapping_name,
                    io::Error::last_os_error(),
                ));
            }

            // SAFETY: mapping handle is valid; a failed map returns null.
            let addr = unsafe { MapViewOfFile(mapping.0, access, 0, 0, size) };
            let view = View(addr.Value.cast());
            if view.0.is_null() {
                return Err(ArgusError::attach(
                    "view",
                    mapping_name,
                    io::Error::last_os_error(),
                ));
            }

            let name = wide(mutex_name);
            // SAFETY: as above.
            let mutex = Handle(unsafe {
                OpenMutexW(
                    SYNCHRONIZATION_SYNCHRONIZE | MUTEX_MODIFY_STATE,
                    0,
                    name.as_ptr(),
                )
            });
            if mutex.0 == 0 {
                return Err(ArgusError::attach(
                    "mutex",
                    mutex_name,
                    io::Error::last_os_error(),
                ));
            }

            Ok(Self {
                view,
                mapping,
                mutex,
                size,
            })
        }

        /// Unsynchronized volatile read. `None` once detached.
        pub(super) fn peek_u32(&self, offset: usize) -> Option<u32> {
            if self.view.0.is_null() {
                return None;
            }
            // SAFETY: caller checked `offset + 4 <= size`; the view is live.
            // `[u8; 4]` has alignment 1 so any offset is valid.
            let bytes = unsafe { std::ptr::read_volatile(self.view.0.add(offset).cast::<[u8; 4]>()) };
            Some(u32::from_le_bytes(bytes))
        }

        pub(super) fn lock(&self) -> Result<LockGuard<'_>> {
            if self.view.0.is_null() || self.mutex.0 == 0 {
                return Err(ArgusError::sync("wait", "region is detached"));
            }
            // SAFETY: mutex handle is valid until `close`, which needs `&mut self`.
            match unsafe { WaitForSingleObject(self.mutex.0, INFINITE) } {
                WAIT_OBJECT_0 => {}
                WAIT_ABANDONED => {
                    warn!("Argus mutex was abandoned by its previous owner; data may be inconsistent");
                }
                _ => return Err(ArgusError::sync("wait", io::Error::last_os_error())),
            }
            Ok(LockGuard {
                objects: self,
                released: false,
            })
        }

        pub(super) fn close(&mut self) -> Result<()> {
            let view = self.view.unmap().map_err(|e| ArgusError::sync("unmap", e));
            let mapping = self.mapping.close().map_err(|e| ArgusError::sync("close", e));
            let mutex = self.mutex.close().map_err(|e| ArgusError::sync("close", e));
            view.and(mapping).and(mutex)
        }
    }

    /// Held producer mutex. Released explicitly or on drop.
    pub(super) struct LockGuard<'a> {
        objects: &'a Objects,
        released: bool,
    }

    impl LockGuard<'_> {
        pub(super) fn bytes(&self) -> &[u8] {
            // SAFETY: the view is live for `'a` and spans `size` bytes; the
            // producer does not write while we hold its mutex.
            unsafe { std::slice::from_raw_parts(self.objects.view.0, self.objects.size) }
        }

        pub(super) fn release(mut self) -> Result<()> {
            self.released = true;
            self.unlock()
        }

        fn unlock(&self) -> Result<()> {
            // SAFETY: we own the mutex since `lock` succeeded.
            if unsafe { ReleaseMutex(self.objects.mutex.0) } == 0 {
                return Err(ArgusError::sync("release", io::Error::last_os_error()));
            }
            Ok(())
        }
    }

    impl Drop for LockGuard<'_> {
        fn drop(&mut self) {
            if !self.released {
                let _ = self.unlock();
            }
        }
    }
}

#[cfg(not(windows))]
mod sys {
    use crate::error::{ArgusError, Result};

    /// Uninhabited: named regions cannot be opened off Windows.
    pub(super) enum Objects {}

    pub(super) enum LockGuard {}

    impl Objects {
        pub(super) fn open(mapping_name: &str, _mutex_name: &str, _size: usize) -> Result<Self> {
            Err(ArgusError::attach(
                "mapping",
                mapping_name,
                "named shared memory is only available on Windows",
            ))
        }

        pub(super) fn peek_u32(&self, _offset: usize) -> Option<u32> {
            match *self {}
        }

        pub(super) fn lock(&self) -> Result<LockGuard> {
            match *self {}
        }

        pub(super) fn close(&mut self) -> Result<()> {
            match *self {}
        }
    }

    impl LockGuard {
        pub(super) fn bytes(&self) -> &[u8] {
            match *self {}
        }

        pub(super) fn release(self) -> Result<()> {
            match self {}
        }
    }
}
