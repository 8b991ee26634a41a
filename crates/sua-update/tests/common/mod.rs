//! Common test infrastructure for sua-update tests
//!
//! # Modules
//!
//! - `constants`: Version strings, artifact names, test payloads
//! - `fakes`: Scripted process runner, recording launcher and reporter
//! - `fixtures`: Fake PE images and fake volume layouts
//! - `mock_server`: Wiremock setup helpers for artifact downloads

// Allow unused code in test infrastructure - not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod fakes;
pub mod fixtures;
pub mod mock_server;

pub use constants::*;
pub use fakes::*;
pub use fixtures::*;
pub use mock_server::*;
