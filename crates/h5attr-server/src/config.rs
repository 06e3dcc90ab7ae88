use std::fmt;
use std::time::Duration;

use anyhow::Context;
use h5attr::StoreConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Upper bound on one store call, including the implicit open.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_timeout_ms: default_request_timeout_ms(),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from an optional YAML file, then apply `H5ATTR_*` overrides.
    ///
    /// Nested keys use a double underscore: `H5ATTR_STORE__DATA_DIR`.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix("H5ATTR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("loading configuration from {}", path.unwrap_or("<env>")))?;

        let config: ServerConfig = settings
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bind={} data_dir={} timeout={}ms mmap={}",
            self.bind_addr,
            self.store.data_dir.display(),
            self.request_timeout_ms,
            self.store.use_mmap
        )
    }
}
