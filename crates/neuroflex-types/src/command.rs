//! Command frame encoding.
//!
//! Every command frame starts with an opcode byte followed by the session
//! authentication byte; parameterized commands append their parameter
//! bytes. Encoding always allocates a fresh buffer, so command values can
//! be shared and re-encoded freely.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Start treatment command opcode.
/// Format: `[START_TREATMENT, auth, 0x00, duration_lo, duration_hi]`
pub const START_TREATMENT: u8 = 0x10;

/// Change stimulation level command opcode.
/// Format: `[CHANGE_LEVEL, auth, knee_delta, thigh_delta]`
pub const CHANGE_LEVEL: u8 = 0x11;

/// Exit level-adjust mode command opcode.
pub const EXIT_ADJUST: u8 = 0x12;

/// Pause treatment command opcode.
pub const PAUSE_TREATMENT: u8 = 0x13;

/// Resume treatment command opcode.
pub const RESUME_TREATMENT: u8 = 0x14;

/// Zero both stimulation levels command opcode.
pub const ZERO_LEVELS: u8 = 0x15;

/// Stop treatment command opcode.
pub const STOP: u8 = 0x30;

/// A command for the controller.
///
/// Parameter ranges are enforced by the field types: durations are 16-bit
/// and level deltas are signed bytes, matching the wire format exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
#[non_exhaustive]
pub enum Command {
    /// Start a treatment of the given duration.
    StartTreatment {
        /// Treatment duration in seconds.
        duration_seconds: u16,
    },
    /// Adjust the stimulation level of each channel by a signed delta.
    ChangeLevel {
        /// Knee channel adjustment.
        knee_delta: i8,
        /// Thigh channel adjustment.
        thigh_delta: i8,
    },
    /// Leave level-adjust mode.
    ExitAdjust,
    /// Pause the running treatment.
    PauseTreatment,
    /// Resume a paused treatment.
    ResumeTreatment,
    /// Reset both stimulation levels to zero.
    ZeroLevels,
    /// Stop the treatment.
    Stop,
}

impl Command {
    /// The opcode carried in byte 0 of the encoded frame.
    pub const fn opcode(&self) -> u8 {
        match self {
            Command::StartTreatment { .. } => START_TREATMENT,
            Command::ChangeLevel { .. } => CHANGE_LEVEL,
            Command::ExitAdjust => EXIT_ADJUST,
            Command::PauseTreatment => PAUSE_TREATMENT,
            Command::ResumeTreatment => RESUME_TREATMENT,
            Command::ZeroLevels => ZERO_LEVELS,
            Command::Stop => STOP,
        }
    }

    /// The fixed length of the encoded frame for this command.
    pub const fn frame_len(&self) -> usize {
        match self {
            Command::StartTreatment { .. } => 5,
            Command::ChangeLevel { .. } => 4,
            _ => 2,
        }
    }

    /// Encode the command into a fresh frame carrying `auth_code` in byte 1.
    ///
    /// Total function: every well-typed command encodes successfully. The
    /// treatment duration is split little-endian across two bytes.
    pub fn encode(&self, auth_code: u8) -> Vec<u8> {
        match *self {
            Command::StartTreatment { duration_seconds } => vec![
                START_TREATMENT,
                auth_code,
                0x00,
                (duration_seconds & 0x00FF) as u8,
                (duration_seconds >> 8) as u8,
            ],
            Command::ChangeLevel {
                knee_delta,
                thigh_delta,
            } => vec![CHANGE_LEVEL, auth_code, knee_delta as u8, thigh_delta as u8],
            Command::ExitAdjust => vec![EXIT_ADJUST, auth_code],
            Command::PauseTreatment => vec![PAUSE_TREATMENT, auth_code],
            Command::ResumeTreatment => vec![RESUME_TREATMENT, auth_code],
            Command::ZeroLevels => vec![ZERO_LEVELS, auth_code],
            Command::Stop => vec![STOP, auth_code],
        }
    }
}
