//! The boundary between the store and whatever actually reads files.

use std::path::Path;

use crate::error::Result;

/// Typed open/read/close primitives for one file-format runtime.
///
/// Reads return the widest natural representation (`i64`, `f64`, the whole
/// string); narrowing and bounding are the store's job.
pub trait AttributeBackend: Send + Sync {
    /// An opened file. Owned by exactly one store entry at a time.
    type Handle: Send;

    fn name(&self) -> &'static str;

    fn open(&self, path: &Path) -> Result<Self::Handle>;

    fn read_int(&self, handle: &Self::Handle, location: &str, name: &str) -> Result<i64>;

    fn read_float(&self, handle: &Self::Handle, location: &str, name: &str) -> Result<f64>;

    fn read_string(&self, handle: &Self::Handle, location: &str, name: &str) -> Result<String>;

    fn close(&self, handle: Self::Handle) -> Result<()>;

    /// When `false` the store serializes every call, across all paths.
    fn supports_concurrent_handles(&self) -> bool {
        true
    }
}
