//! HTTP facade over the h5attr attribute store.

pub mod config;
pub mod server;

pub use config::ServerConfig;
pub use server::{router, run_server, AppState};
