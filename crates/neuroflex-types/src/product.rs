//! Product-info (firmware version) frame decoding.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum number of bytes required for a product-info frame to carry a
/// firmware version.
pub const MIN_PRODUCT_INFO_BYTES: usize = 13;

/// Version string reported for frames too short to decode.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Firmware version decoded from a product-info frame.
///
/// Frames shorter than [`MIN_PRODUCT_INFO_BYTES`] decode to the all-zero
/// default with an [`UNKNOWN_VERSION`] version string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProductInfo {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Release number.
    pub release: u8,
    /// Build number.
    pub build: u8,
    /// Formatted `MM.mm.rr.bb` version string.
    pub version: String,
}

impl Default for ProductInfo {
    fn default() -> Self {
        Self {
            major: 0,
            minor: 0,
            release: 0,
            build: 0,
            version: UNKNOWN_VERSION.to_string(),
        }
    }
}

impl ProductInfo {
    /// Decode a product-info frame.
    ///
    /// Bytes 9-12 carry major/minor/release/build. Never fails; a short
    /// frame yields the default.
    pub fn from_frame(frame: &[u8]) -> Self {
        if frame.len() < MIN_PRODUCT_INFO_BYTES {
            return Self::default();
        }

        let (major, minor, release, build) = (frame[9], frame[10], frame[11], frame[12]);
        Self {
            major,
            minor,
            release,
            build,
            version: format!("{major:02}.{minor:02}.{release:02}.{build:02}"),
        }
    }
}

impl fmt::Display for ProductInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}
