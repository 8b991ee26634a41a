//! Shared constants for test infrastructure

pub const TARGET_VERSION: &str = "3.6.6";
pub const LEGACY_VERSION: &str = "3.5.3";

pub const BOOTSTRAP_FILE: &str = "InstaladorSUA353.exe";
pub const TARGET_ARTIFACT: &str = "VersionSUA366.exe";

pub const EXECUTABLE_NAME: &str = "SUA.exe";
pub const DEFAULT_INSTALL_DIR: &str = "Cobranza/SUA";

pub const FAKE_INSTALLER_CONTENT: &[u8] = b"fake installer content for testing";
