//! Platform-agnostic protocol types for NeuroFlex therapy controllers.
//!
//! This crate provides the binary protocol layer shared by every transport
//! implementation: status and product-info frame decoders, the command
//! encoder, and the BLE identifier constants.
//!
//! # Features
//!
//! - Status frame decoding with per-field tolerance to short frames
//! - Firmware version (product info) frame decoding
//! - Command frame encoding with per-session authentication byte
//! - UUID constants for the controller service and characteristics
//!
//! # Example
//!
//! ```
//! use neuroflex_types::{Command, DeviceStatus};
//!
//! // Decode a status notification frame
//! let status = DeviceStatus::from_frame(&[0x11, 0x50, 0x20, 0x01, 0, 0, 40, 35, 0x2C, 0x01]);
//! assert!(status.treatment_active);
//!
//! // Encode a command frame for the controller
//! let frame = Command::PauseTreatment.encode(0x42);
//! assert_eq!(frame, vec![0x13, 0x42]);
//! ```

pub mod command;
pub mod product;
pub mod status;
pub mod uuid;

pub use command::Command;
pub use product::ProductInfo;
pub use status::{ControllerStatus, DeviceStatus, SheetStatus, SkinContact, StimLevels};
pub use uuid as uuids;
