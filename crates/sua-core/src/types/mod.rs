//! Type definitions for updater configuration and releases

mod release;
mod updater_config;

pub use release::*;
pub use updater_config::*;
