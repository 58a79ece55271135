//! Bluetooth UUIDs for NeuroFlex controllers.
//!
//! This module contains the UUIDs needed to communicate with a NeuroFlex
//! therapy controller over Bluetooth Low Energy.

use uuid::{Uuid, uuid};

// --- NeuroFlex Service UUIDs ---

/// Controller service exposing the command, status, and product-info
/// characteristics.
pub const CONTROLLER_SERVICE: Uuid = uuid!("cece1130-0101-0000-a000-000000000000");

/// NeuroFlex manufacturer ID for BLE advertisements.
pub const MANUFACTURER_ID: u16 = 0x0C0E;

// --- NeuroFlex Characteristic UUIDs ---

/// Command characteristic; accepts encoded command frames carrying the
/// session authentication byte.
pub const COMMAND: Uuid = uuid!("cece1141-0101-0000-b000-000000000000");

/// Status characteristic; notifies status frames while subscribed.
pub const STATUS: Uuid = uuid!("cece1131-0101-0000-b000-000000000000");

/// Product-info characteristic; notifies (and serves one-shot reads of)
/// firmware version frames.
pub const PRODUCT_INFO: Uuid = uuid!("cece1132-0101-0000-b000-000000000000");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_service_uuid() {
        let expected = "cece1130-0101-0000-a000-000000000000";
        assert_eq!(CONTROLLER_SERVICE.to_string(), expected);
    }

    #[test]
    fn test_command_uuid() {
        let expected = "cece1141-0101-0000-b000-000000000000";
        assert_eq!(COMMAND.to_string(), expected);
    }

    #[test]
    fn test_status_uuid() {
        let expected = "cece1131-0101-0000-b000-000000000000";
        assert_eq!(STATUS.to_string(), expected);
    }

    #[test]
    fn test_product_info_uuid() {
        let expected = "cece1132-0101-0000-b000-000000000000";
        assert_eq!(PRODUCT_INFO.to_string(), expected);
    }

    #[test]
    fn test_characteristic_uuids_are_distinct() {
        assert_ne!(COMMAND, STATUS);
        assert_ne!(STATUS, PRODUCT_INFO);
        assert_ne!(COMMAND, PRODUCT_INFO);
    }

    #[test]
    fn test_neuroflex_uuid_prefix() {
        // All NeuroFlex identifiers share the cece vendor prefix
        for uuid in [CONTROLLER_SERVICE, COMMAND, STATUS, PRODUCT_INFO] {
            assert!(
                uuid.to_string().starts_with("cece"),
                "UUID {} should start with cece",
                uuid
            );
        }
    }
}
