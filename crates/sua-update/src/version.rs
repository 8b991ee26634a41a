//! Installed version probing and update decision
//!
//! Windows executables carry their version in a `VS_FIXEDFILEINFO` block inside
//! the version resource. The block starts with the signature `0xFEEF04BD` and
//! stores the file version as two 32-bit words: `dwFileVersionMS` holds
//! major/minor in its high/low halves, `dwFileVersionLS` holds build/revision.
//! The probe scans the raw image for that block, so it works on any host.

use semver::Version;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// `VS_FIXEDFILEINFO.dwSignature`
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// `VS_FIXEDFILEINFO.dwStrucVersion` for every version resource in use
const FIXED_FILE_INFO_STRUC_VERSION: u32 = 0x0001_0000;

/// DOS header magic that every PE image starts with
const DOS_MAGIC: &[u8; 2] = b"MZ";

/// Read the `major.minor.build` file version embedded in an executable
///
/// Returns `None` when the file is missing, is not a PE image, or carries no
/// well-formed version resource. Never fails.
pub fn probe_version(path: &Path) -> Option<Version> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            debug!("Cannot read {:?} for version probe: {}", path, e);
            return None;
        }
    };

    let version = parse_fixed_file_info(&data);
    match &version {
        Some(v) => debug!("Probed version {} from {:?}", v, path),
        None => debug!("No version resource found in {:?}", path),
    }
    version
}

/// Extract the file version from raw PE image bytes
pub fn parse_fixed_file_info(data: &[u8]) -> Option<Version> {
    if !data.starts_with(DOS_MAGIC) {
        return None;
    }

    let signature = FIXED_FILE_INFO_SIGNATURE.to_le_bytes();

    // Signature, struc version, MS word, LS word
    const BLOCK_LEN: usize = 16;

    let mut offset = 0;
    while let Some(found) = find(&data[offset..], &signature) {
        let start = offset + found;
        let block = data.get(start..start + BLOCK_LEN)?;

        if read_u32(block, 4) == FIXED_FILE_INFO_STRUC_VERSION {
            let ms = read_u32(block, 8);
            let ls = read_u32(block, 12);
            return Some(Version::new(
                u64::from(hiword(ms)),
                u64::from(loword(ms)),
                u64::from(hiword(ls)),
            ));
        }

        offset = start + 1;
    }

    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn read_u32(block: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&block[at..at + 4]);
    u32::from_le_bytes(bytes)
}

fn hiword(value: u32) -> u16 {
    (value >> 16) as u16
}

fn loword(value: u32) -> u16 {
    (value & 0xFFFF) as u16
}

/// Outcome of comparing the installed version against the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionDecision {
    /// Installed version is the target version
    UpToDate,

    /// Installed version must be replaced
    NeedsUpdate { reason: UpdateReason },
}

/// Why an update is required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    /// The installed version could not be determined
    UnknownVersion,

    /// The installed version is a release that is always replaced
    ForcedUpgrade,

    /// The installed version differs from the target
    VersionMismatch,
}

/// Decide whether the installed version needs replacing
///
/// Versions are compared structurally, so `3.6.6` and `3.6.60` are different
/// releases. Forced-upgrade versions win over everything else.
pub fn decide(installed: Option<&Version>, target: &Version, forced: &[Version]) -> VersionDecision {
    let Some(installed) = installed else {
        return VersionDecision::NeedsUpdate {
            reason: UpdateReason::UnknownVersion,
        };
    };

    if forced.contains(installed) {
        return VersionDecision::NeedsUpdate {
            reason: UpdateReason::ForcedUpgrade,
        };
    }

    if installed == target {
        return VersionDecision::UpToDate;
    }

    if installed > target {
        warn!("Installed version {} is newer than target {}; it will be replaced", installed, target);
    }

    VersionDecision::NeedsUpdate {
        reason: UpdateReason::VersionMismatch,
    }
}
