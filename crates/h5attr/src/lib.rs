//! Scalar attribute access over HDF5 files.
//!
//! An [`AttributeStore`] turns `(path, location, name)` lookups into
//! `(StatusCode, value)` pairs. The first get-operation on a path opens the
//! file and the handle stays open until [`AttributeStore::close`] is called.
//!
//! ```no_run
//! use h5attr::{AttributeStore, StatusCode, StoreConfig};
//!
//! let store = AttributeStore::initialize(&StoreConfig::with_data_dir("/data/h5")).unwrap();
//! let (status, interval) = store.get_float_attribute("run1.h5", "/FullSpectra", "SampleInterval");
//! if status == StatusCode::Success {
//!     println!("sample interval {interval}");
//! }
//! store.close("run1.h5");
//! ```

pub mod acquisition;
pub mod backend;
pub mod config;
pub mod error;
pub mod handle;
pub mod inventory;
pub mod native;
pub mod status;
pub mod store;
pub mod value;

#[cfg(test)]
mod testing;

pub use backend::AttributeBackend;
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use inventory::list_h5_files;
pub use native::{H5File, NativeBackend};
pub use status::StatusCode;
pub use store::AttributeStore;
pub use value::{AttributeKind, AttributeRequest, AttributeValue, MAX_STRING_BYTES};
