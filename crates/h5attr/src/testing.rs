//! In-memory backend for store tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use h5attr_format::FormatError;

use crate::backend::AttributeBackend;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
enum Stored {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Stored {
    fn kind(&self) -> &'static str {
        match self {
            Stored::Int(_) => "integer",
            Stored::Float(_) => "float",
            Stored::Str(_) => "string",
        }
    }
}

#[derive(Debug)]
pub struct MockHandle {
    path: String,
}

#[derive(Debug, Default)]
pub struct MockBackend {
    files: HashSet<String>,
    values: HashMap<(String, String, String), Stored>,
    serial: bool,
    delay: Duration,
    opens: AtomicUsize,
    closes: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, path: &str, location: &str, name: &str, v: Stored) -> Self {
        self.files.insert(path.to_string());
        self.values
            .insert((path.to_string(), location.to_string(), name.to_string()), v);
        self
    }

    pub fn with_int(self, path: &str, location: &str, name: &str, v: i64) -> Self {
        self.with(path, location, name, Stored::Int(v))
    }

    pub fn with_float(self, path: &str, location: &str, name: &str, v: f64) -> Self {
        self.with(path, location, name, Stored::Float(v))
    }

    pub fn with_str(self, path: &str, location: &str, name: &str, v: &str) -> Self {
        self.with(path, location, name, Stored::Str(v.to_string()))
    }

    /// Report `supports_concurrent_handles() == false`.
    pub fn serial(mut self) -> Self {
        self.serial = true;
        self
    }

    /// Sleep inside every read so overlapping calls can be observed.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Most reads that were ever in flight at the same time.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn lookup(&self, handle: &MockHandle, location: &str, name: &str) -> Result<Stored> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let key = (handle.path.clone(), location.to_string(), name.to_string());
        self.values
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::AttributeNotFound {
                location: location.to_string(),
                name: name.to_string(),
            })
    }
}

fn mismatch(expected: &'static str, found: &Stored) -> Error {
    Error::Format(FormatError::TypeMismatch {
        expected,
        actual: found.kind(),
    })
}

impl AttributeBackend for MockBackend {
    type Handle = MockHandle;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn open(&self, path: &Path) -> Result<MockHandle> {
        let path = path.to_string_lossy().into_owned();
        if !self.files.contains(&path) {
            return Err(Error::FileNotFound(path.into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(MockHandle { path })
    }

    fn read_int(&self, handle: &MockHandle, location: &str, name: &str) -> Result<i64> {
        match self.lookup(handle, location, name)? {
            Stored::Int(v) => Ok(v),
            other => Err(mismatch("integer", &other)),
        }
    }

    fn read_float(&self, handle: &MockHandle, location: &str, name: &str) -> Result<f64> {
        match self.lookup(handle, location, name)? {
            Stored::Float(v) => Ok(v),
            other => Err(mismatch("float", &other)),
        }
    }

    fn read_string(&self, handle: &MockHandle, location: &str, name: &str) -> Result<String> {
        match self.lookup(handle, location, name)? {
            Stored::Str(v) => Ok(v),
            other => Err(mismatch("string", &other)),
        }
    }

    fn close(&self, _handle: MockHandle) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn supports_concurrent_handles(&self) -> bool {
        !self.serial
    }
}
