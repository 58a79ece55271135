//! Authentication code derivation from advertisement data.
//!
//! Every command frame carries a single authentication byte derived once
//! per connection from the controller's advertised manufacturer data. The
//! payload is ASCII text: a fixed 2-character vendor prefix followed by
//! the controller identifier. The auth code is a positionally weighted
//! checksum of the identifier characters. This is a pairing convenience,
//! not a security boundary.

use tracing::debug;

/// Auth code substituted when the advertisement payload cannot be derived
/// from (non-text, empty after prefix stripping, or otherwise malformed).
pub const FALLBACK_AUTH_CODE: u8 = 0x42;

/// Vendor prefix carried ahead of the controller identifier in the
/// advertised manufacturer data.
pub const VENDOR_PREFIX: &str = "NF";

/// Derive the session authentication code from raw manufacturer data.
///
/// The identifier after the vendor prefix is summed as
/// `sum(byte(c_i) * i) mod 256` with 1-indexed character positions.
/// Any malformed input yields [`FALLBACK_AUTH_CODE`] instead of an error.
///
/// # Example
///
/// ```
/// use neuroflex_core::auth::{calculate_auth_code, FALLBACK_AUTH_CODE};
///
/// // 'A' * 1 + '1' * 2 = 65 + 98 = 163
/// assert_eq!(calculate_auth_code(b"NFA1"), 163);
/// assert_eq!(calculate_auth_code(&[]), FALLBACK_AUTH_CODE);
/// ```
pub fn calculate_auth_code(manufacturer_data: &[u8]) -> u8 {
    match derive_auth_code(manufacturer_data) {
        Some(code) => code,
        None => {
            debug!(
                "Advertisement payload not derivable ({} bytes), using fallback auth code",
                manufacturer_data.len()
            );
            FALLBACK_AUTH_CODE
        }
    }
}

fn derive_auth_code(data: &[u8]) -> Option<u8> {
    let text = std::str::from_utf8(data).ok()?;
    if !text.is_ascii() {
        return None;
    }

    let identifier = text.get(VENDOR_PREFIX.len()..)?;
    if identifier.is_empty() {
        return None;
    }

    let sum: u32 = identifier
        .bytes()
        .zip(1u32..)
        .map(|(byte, position)| byte as u32 * position)
        .sum();
    Some((sum % 256) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_checksum() {
        // 'A' * 1 + '1' * 2 = 65 + 98 = 163
        assert_eq!(calculate_auth_code(b"NFA1"), 163);

        // Single-character identifier: '7' * 1 = 55
        assert_eq!(calculate_auth_code(b"NF7"), 55);
    }

    #[test]
    fn test_checksum_wraps_modulo_256() {
        // 'Z' * (1..=8): 90 * 36 = 3240; 3240 mod 256 = 168
        assert_eq!(calculate_auth_code(b"NFZZZZZZZZ"), 168);
    }

    #[test]
    fn test_position_weighting_is_order_sensitive() {
        assert_ne!(calculate_auth_code(b"NFAB"), calculate_auth_code(b"NFBA"));
    }

    #[test]
    fn test_empty_payload_falls_back() {
        assert_eq!(calculate_auth_code(&[]), FALLBACK_AUTH_CODE);
    }

    #[test]
    fn test_prefix_only_payload_falls_back() {
        assert_eq!(calculate_auth_code(b"NF"), FALLBACK_AUTH_CODE);
        assert_eq!(calculate_auth_code(b"N"), FALLBACK_AUTH_CODE);
    }

    #[test]
    fn test_non_text_payload_falls_back() {
        assert_eq!(calculate_auth_code(&[0xFF, 0xFE, 0x01]), FALLBACK_AUTH_CODE);
    }

    #[test]
    fn test_non_ascii_text_falls_back() {
        assert_eq!(calculate_auth_code("NFé1".as_bytes()), FALLBACK_AUTH_CODE);
    }

    #[test]
    fn test_same_payload_same_code() {
        let payload = b"NF0A1B2C";
        assert_eq!(calculate_auth_code(payload), calculate_auth_code(payload));
    }
}
