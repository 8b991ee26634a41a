//! Fake PE images and volume layouts

use std::fs;
use std::path::{Path, PathBuf};

use super::constants::*;

/// Minimal image with an `MZ` header and a `VS_FIXEDFILEINFO` block
pub fn fake_pe_image(major: u16, minor: u16, build: u16) -> Vec<u8> {
    let mut image = b"MZ".to_vec();
    image.extend_from_slice(&[0u8; 62]);
    image.extend_from_slice(&0xFEEF_04BDu32.to_le_bytes());
    image.extend_from_slice(&0x0001_0000u32.to_le_bytes());
    image.extend_from_slice(&((u32::from(major) << 16) | u32::from(minor)).to_le_bytes());
    image.extend_from_slice(&(u32::from(build) << 16).to_le_bytes());
    image.extend_from_slice(&[0u8; 64]);
    image
}

/// Parse "a.b.c" into three words
pub fn version_words(version: &str) -> (u16, u16, u16) {
    let parts: Vec<u16> = version.split('.').map(|p| p.parse().unwrap()).collect();
    (parts[0], parts[1], parts[2])
}

/// Path the default layout puts the executable at on `volume`
pub fn default_install_path(volume: &Path) -> PathBuf {
    volume.join(DEFAULT_INSTALL_DIR).join(EXECUTABLE_NAME)
}

/// Write a fake executable reporting `version` at `path`
pub fn write_executable(path: &Path, version: &str) {
    let (major, minor, build) = version_words(version);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, fake_pe_image(major, minor, build)).unwrap();
}

/// Install a fake executable in the default layout of `volume`
pub fn install_fake_sua(volume: &Path, version: &str) -> PathBuf {
    let path = default_install_path(volume);
    write_executable(&path, version);
    path
}
