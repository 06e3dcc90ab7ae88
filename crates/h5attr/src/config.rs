use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for the native backend and the store that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Relative file paths are resolved against this directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Map files into memory instead of reading them into a buffer.
    #[serde(default = "default_use_mmap")]
    pub use_mmap: bool,

    /// Serialize all attribute access behind one store-wide lock.
    #[serde(default)]
    pub serialize_globally: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_use_mmap() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            use_mmap: default_use_mmap(),
            serialize_globally: false,
        }
    }
}

impl StoreConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: StoreConfig = serde_json::from_str(r#"{"data_dir": "/srv/h5"}"#).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/h5"));
        assert!(cfg.use_mmap);
        assert!(!cfg.serialize_globally);

        let cfg: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, StoreConfig::default());
    }
}
