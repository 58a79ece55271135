//! Status frame decoding.
//!
//! A NeuroFlex controller pushes status frames over the status
//! characteristic while a subscription is active. Frames are fixed-layout
//! but may arrive truncated; every field is decoded independently and a
//! frame too short for a field yields that field's documented default
//! instead of an error.
//!
//! Frame layout:
//! - byte 0, bit 0: treatment active
//! - byte 0, bits 4-7: controller status code
//! - byte 1, bits 0-6: battery raw (0-127, scaled to 0-100)
//! - byte 1, bit 7: charging
//! - byte 2: temperature in °C (raw)
//! - byte 3, bits 0-5: sheet docking code
//! - byte 3, bit 6: right skin contact
//! - byte 3, bit 7: left skin contact
//! - bytes 4-5: stim index (u16 LE) while no treatment is active
//! - byte 6: knee stimulation level (0-100)
//! - byte 7: thigh stimulation level (0-100)
//! - bytes 8-9: stim index (u16 LE) while a treatment is active

use core::fmt;

use bytes::Buf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Battery level reported when the frame is too short to carry one.
pub const BATTERY_UNKNOWN: i8 = -1;

/// Which physical therapy sheet (pad pair) is seated on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum SheetStatus {
    /// No sheet is docked.
    Undocked,
    /// Left-leg sheet is docked.
    Left,
    /// Right-leg sheet is docked.
    Right,
    /// The controller reported a sheet fault.
    Fault,
    /// Reserved or transitional code; the controller emits these between
    /// docking states.
    Unknown,
}

impl SheetStatus {
    /// Decode a sheet docking code (byte 3, bits 0-5).
    ///
    /// Codes outside the documented set map to [`SheetStatus::Unknown`]
    /// rather than erroring; the controller emits reserved codes while a
    /// sheet is being seated.
    pub fn from_code(code: u8) -> Self {
        match code & 0x3F {
            0 => SheetStatus::Undocked,
            1 => SheetStatus::Left,
            2 => SheetStatus::Right,
            62 => SheetStatus::Fault,
            _ => SheetStatus::Unknown,
        }
    }
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetStatus::Undocked => write!(f, "Undocked"),
            SheetStatus::Left => write!(f, "Left"),
            SheetStatus::Right => write!(f, "Right"),
            SheetStatus::Fault => write!(f, "Fault"),
            SheetStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Controller operating state (byte 0, bits 4-7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum ControllerStatus {
    /// Powered on, no treatment running.
    Idle,
    /// Stimulation in progress.
    Stim,
    /// Battery too low to start a treatment.
    BatLow,
    /// Controller fault.
    Fault,
    /// Controller is powering off.
    Poweroff,
    /// Over-the-air firmware update in progress.
    Oad,
    /// Charging on the dock.
    Charging,
    /// Unrecognized status code, retained for diagnostics.
    Unknown(u8),
}

impl ControllerStatus {
    /// Decode a controller status nibble.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ControllerStatus::Idle,
            1 => ControllerStatus::Stim,
            2 => ControllerStatus::BatLow,
            3 => ControllerStatus::Fault,
            4 => ControllerStatus::Poweroff,
            5 => ControllerStatus::Oad,
            6 => ControllerStatus::Charging,
            other => ControllerStatus::Unknown(other),
        }
    }
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerStatus::Idle => write!(f, "Idle"),
            ControllerStatus::Stim => write!(f, "Stim"),
            ControllerStatus::BatLow => write!(f, "BatLow"),
            ControllerStatus::Fault => write!(f, "Fault"),
            ControllerStatus::Poweroff => write!(f, "Poweroff"),
            ControllerStatus::Oad => write!(f, "Oad"),
            ControllerStatus::Charging => write!(f, "Charging"),
            ControllerStatus::Unknown(code) => write!(f, "Unknown(0x{:02X})", code),
        }
    }
}

/// Skin contact detection per leg electrode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkinContact {
    /// Left electrode in contact with skin.
    pub left: bool,
    /// Right electrode in contact with skin.
    pub right: bool,
}

/// Stimulation intensity per channel (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StimLevels {
    /// Knee channel intensity.
    pub knee: u8,
    /// Thigh channel intensity.
    pub thigh: u8,
}

/// Decoded controller status frame.
///
/// Every field is decoded independently from the raw frame; a frame too
/// short for a field carries that field's default (see the module
/// documentation). Values are transient and recomputed per received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceStatus {
    /// Battery level percentage (0-100), or [`BATTERY_UNKNOWN`].
    pub battery_level: i8,
    /// Whether the controller is charging.
    pub is_charging: bool,
    /// Controller temperature in °C.
    pub temperature_c: u8,
    /// Sheet docking state, if the frame carried one.
    pub sheet_status: Option<SheetStatus>,
    /// Skin contact detection.
    pub skin_contact: SkinContact,
    /// Stimulation levels per channel.
    pub stim_levels: StimLevels,
    /// Whether a treatment is currently active.
    pub treatment_active: bool,
    /// Controller operating state.
    pub controller_status: ControllerStatus,
    /// Elapsed-time counter for the active (or most recent) stimulation,
    /// if the frame carried one.
    pub stim_index: Option<u16>,
}

impl DeviceStatus {
    /// Decode a status frame of arbitrary length.
    ///
    /// Never fails; short frames yield per-field defaults.
    pub fn from_frame(frame: &[u8]) -> Self {
        Self {
            battery_level: decode_battery_level(frame),
            is_charging: decode_is_charging(frame),
            temperature_c: decode_temperature(frame),
            sheet_status: decode_sheet_status(frame),
            skin_contact: decode_skin_contact(frame),
            stim_levels: decode_stim_levels(frame),
            treatment_active: decode_treatment_active(frame),
            controller_status: decode_controller_status(frame),
            stim_index: decode_stim_index(frame),
        }
    }
}

/// Decode the battery level (byte 1, bits 0-6, scaled from 0-127 to 0-100).
///
/// Returns [`BATTERY_UNKNOWN`] when the frame is shorter than 2 bytes.
pub fn decode_battery_level(frame: &[u8]) -> i8 {
    match frame.get(1) {
        Some(byte) => {
            let raw = byte & 0x7F;
            ((raw as f32 / 127.0) * 100.0).round() as i8
        }
        None => BATTERY_UNKNOWN,
    }
}

/// Decode the charging flag (byte 1, bit 7).
pub fn decode_is_charging(frame: &[u8]) -> bool {
    frame.get(1).is_some_and(|byte| byte & 0x80 != 0)
}

/// Decode the controller temperature in °C (byte 2, raw value).
pub fn decode_temperature(frame: &[u8]) -> u8 {
    frame.get(2).copied().unwrap_or(0)
}

/// Decode the sheet docking state (byte 3, bits 0-5).
///
/// Returns `None` when the frame is shorter than 4 bytes.
pub fn decode_sheet_status(frame: &[u8]) -> Option<SheetStatus> {
    frame.get(3).map(|byte| SheetStatus::from_code(byte & 0x3F))
}

/// Decode skin contact detection (byte 3, bit 7 = left, bit 6 = right).
pub fn decode_skin_contact(frame: &[u8]) -> SkinContact {
    match frame.get(3) {
        Some(byte) => SkinContact {
            left: byte & 0x80 != 0,
            right: byte & 0x40 != 0,
        },
        None => SkinContact::default(),
    }
}

/// Decode the stimulation levels (byte 6 = knee, byte 7 = thigh).
pub fn decode_stim_levels(frame: &[u8]) -> StimLevels {
    StimLevels {
        knee: frame.get(6).copied().unwrap_or(0),
        thigh: frame.get(7).copied().unwrap_or(0),
    }
}

/// Decode the treatment-active flag (byte 0, bit 0).
pub fn decode_treatment_active(frame: &[u8]) -> bool {
    frame.first().is_some_and(|byte| byte & 0x01 != 0)
}

/// Decode the controller operating state (byte 0, bits 4-7).
pub fn decode_controller_status(frame: &[u8]) -> ControllerStatus {
    match frame.first() {
        Some(byte) => ControllerStatus::from_code(byte >> 4),
        None => ControllerStatus::Unknown(0),
    }
}

/// Decode the stim index (u16 LE).
///
/// The byte offset depends on the treatment-active flag: bytes 8-9 during
/// a treatment, bytes 4-5 otherwise. The flag is evaluated first. Returns
/// `None` when the frame is shorter than the selected offset requires.
pub fn decode_stim_index(frame: &[u8]) -> Option<u16> {
    let offset = if decode_treatment_active(frame) { 8 } else { 4 };
    let mut bytes = frame.get(offset..offset + 2)?;
    Some(bytes.get_u16_le())
}
