//! # sua-core
//!
//! Core library for the SUA updater providing:
//! - Updater configuration types (`updater-defaults.yaml` shape)
//! - Hierarchical configuration loading (embedded defaults, user file, environment)
//! - Target release derivation (download URL and artifact file name)
//! - Error types shared by the updater crates

pub mod config;
pub mod error;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::{NetworkConfig, SearchConfig, TargetRelease, UpdaterConfig};
