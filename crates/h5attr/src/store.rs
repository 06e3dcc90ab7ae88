//! The attribute store: typed, status-coded reads with implicit open and
//! explicit close.
//!
//! Locking protocol:
//!
//! 1. the handle table mutex is held only long to find or insert an entry
//!    and clone its `Arc`; it is never held while waiting on an entry lock;
//! 2. the entry mutex serializes every operation on one path;
//! 3. `close` and failed opens remove the entry while still holding its
//!    lock, so callers that raced onto a retired entry see `Closed` and
//!    go back to the table for a fresh one.
//!
//! When the backend cannot keep several handles in flight, a store-wide
//! lock is taken before any of the above.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::AttributeBackend;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::handle::FileHandle;
use crate::native::NativeBackend;
use crate::status::StatusCode;
use crate::value::{bound_string, AttributeKind, AttributeRequest, AttributeValue};

type Entry<H> = Arc<Mutex<FileHandle<H>>>;

/// A poisoned lock only means another caller panicked mid-read; the table
/// and handle states are still consistent.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct AttributeStore<B: AttributeBackend = NativeBackend> {
    backend: B,
    handles: Mutex<HashMap<PathBuf, Entry<B::Handle>>>,
    global: Mutex<()>,
}

impl AttributeStore<NativeBackend> {
    /// Build a store over the native backend.
    pub fn initialize(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(NativeBackend::initialize(config)?))
    }
}

impl<B: AttributeBackend> AttributeStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handles: Mutex::new(HashMap::new()),
            global: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of paths with a live table entry.
    pub fn open_handles(&self) -> usize {
        lock(&self.handles).len()
    }

    pub fn is_open(&self, path: impl AsRef<Path>) -> bool {
        let Some(entry) = lock(&self.handles).get(path.as_ref()).cloned() else {
            return false;
        };
        let open = lock(&entry).is_open();
        open
    }

    fn serial_guard(&self) -> Option<MutexGuard<'_, ()>> {
        (!self.backend.supports_concurrent_handles()).then(|| lock(&self.global))
    }

    fn entry(&self, path: &Path) -> Entry<B::Handle> {
        lock(&self.handles)
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(FileHandle::new(path))))
            .clone()
    }

    /// Drop `entry` from the table unless it was already replaced.
    fn retire(&self, path: &Path, entry: &Entry<B::Handle>) {
        let mut table = lock(&self.handles);
        if table.get(path).is_some_and(|current| Arc::ptr_eq(current, entry)) {
            table.remove(path);
        }
    }

    fn with_handle<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&B, &B::Handle) -> Result<T>,
    ) -> Result<T> {
        let _serial = self.serial_guard();
        loop {
            let entry = self.entry(path);
            let mut handle = lock(&entry);
            if handle.is_closed() {
                // closed under us between the table lookup and the lock
                drop(handle);
                self.retire(path, &entry);
                continue;
            }
            let result = handle.read(&self.backend, f);
            if handle.is_closed() {
                self.retire(path, &entry);
            }
            return result;
        }
    }

    fn read_int(&self, req: &AttributeRequest) -> Result<i32> {
        let v = self.with_handle(req.path(), |b, h| b.read_int(h, req.location(), req.name()))?;
        i32::try_from(v).map_err(|_| Error::OutOfRange(v))
    }

    fn read_float(&self, req: &AttributeRequest) -> Result<f64> {
        let v = self.with_handle(req.path(), |b, h| b.read_float(h, req.location(), req.name()))?;
        Ok(f64::from(v as f32))
    }

    fn read_str(&self, req: &AttributeRequest) -> Result<(String, bool)> {
        let s = self.with_handle(req.path(), |b, h| b.read_string(h, req.location(), req.name()))?;
        Ok(bound_string(s))
    }

    /// Read an integer attribute that fits in `i32`.
    pub fn get_int_attribute(
        &self,
        path: impl AsRef<Path>,
        location: &str,
        name: &str,
    ) -> (StatusCode, i32) {
        let req = AttributeRequest::new(path.as_ref(), location, name);
        match self.read_int(&req) {
            Ok(v) => (StatusCode::Success, v),
            Err(e) => (report(&req, &e), 0),
        }
    }

    /// Read a float attribute with single-precision semantics.
    pub fn get_float_attribute(
        &self,
        path: impl AsRef<Path>,
        location: &str,
        name: &str,
    ) -> (StatusCode, f64) {
        let req = AttributeRequest::new(path.as_ref(), location, name);
        match self.read_float(&req) {
            Ok(v) => (StatusCode::Success, v),
            Err(e) => (report(&req, &e), 0.0),
        }
    }

    /// Read a string attribute, cut to 255 bytes with `ValueAdjusted` if longer.
    pub fn get_str_attribute(
        &self,
        path: impl AsRef<Path>,
        location: &str,
        name: &str,
    ) -> (StatusCode, String) {
        let req = AttributeRequest::new(path.as_ref(), location, name);
        match self.read_str(&req) {
            Ok((s, false)) => (StatusCode::Success, s),
            Ok((s, true)) => {
                tracing::debug!(request = %req, "string value truncated");
                (StatusCode::ValueAdjusted, s)
            }
            Err(e) => (report(&req, &e), String::new()),
        }
    }

    /// Dispatch on `kind`; the value slot holds a placeholder on failure.
    pub fn get(&self, req: &AttributeRequest, kind: AttributeKind) -> (StatusCode, AttributeValue) {
        let (loc, name) = (req.location(), req.name());
        match kind {
            AttributeKind::Int => {
                let (s, v) = self.get_int_attribute(req.path(), loc, name);
                (s, AttributeValue::Int32(v))
            }
            AttributeKind::Float => {
                let (s, v) = self.get_float_attribute(req.path(), loc, name);
                (s, AttributeValue::Float64(v))
            }
            AttributeKind::Str => {
                let (s, v) = self.get_str_attribute(req.path(), loc, name);
                (s, AttributeValue::String(v))
            }
        }
    }

    /// Close the handle for `path`. A path with no handle reports `Success`.
    pub fn close(&self, path: impl AsRef<Path>) -> StatusCode {
        let path = path.as_ref();
        let _serial = self.serial_guard();
        let Some(entry) = lock(&self.handles).get(path).cloned() else {
            return StatusCode::Success;
        };
        let mut handle = lock(&entry);
        let result = handle.close(&self.backend);
        self.retire(path, &entry);
        match result {
            Ok(()) => StatusCode::Success,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "close failed");
                e.status()
            }
        }
    }

    /// Close every open handle.
    pub fn close_all(&self) {
        let paths: Vec<PathBuf> = lock(&self.handles).keys().cloned().collect();
        for path in paths {
            self.close(&path);
        }
    }
}

impl<B: AttributeBackend> Drop for AttributeStore<B> {
    fn drop(&mut self) {
        self.close_all();
    }
}

impl<B: AttributeBackend + std::fmt::Debug> std::fmt::Debug for AttributeStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("backend", &self.backend)
            .field("open_handles", &self.open_handles())
            .finish()
    }
}

fn report(req: &AttributeRequest, err: &Error) -> StatusCode {
    let status = err.status();
    tracing::debug!(request = %req, %status, error = %err, "attribute read failed");
    status
}
