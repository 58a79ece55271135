//! Therapy pad wear accounting.
//!
//! Pads wear out with use and have a fixed maximum lifetime. This module
//! derives remaining-life percentages and replacement warnings from
//! cumulative usage values. The usage mapping itself is owned by an
//! external persistence layer; everything here is a pure transformation
//! of values it is given.
//!
//! # Example
//!
//! ```
//! use neuroflex_core::padlife::PadLife;
//!
//! let padlife = PadLife::default();
//! assert_eq!(padlife.remaining_percentage(14_400), 50);
//! assert!(!padlife.threshold_reached(14_400));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum pad lifetime in seconds (8 hours of cumulative use).
pub const MAX_PAD_LIFETIME_SECONDS: u32 = 28_800;

/// Remaining-life percentage below which a pad needs replacement.
pub const REPLACEMENT_WARNING_PERCENTAGE: u8 = 15;

/// Configuration for pad-life accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadLifeConfig {
    /// Maximum cumulative usage in seconds.
    pub max_lifetime_seconds: u32,
    /// Remaining percentage below which replacement is due.
    pub warning_percentage: u8,
}

impl Default for PadLifeConfig {
    fn default() -> Self {
        Self {
            max_lifetime_seconds: MAX_PAD_LIFETIME_SECONDS,
            warning_percentage: REPLACEMENT_WARNING_PERCENTAGE,
        }
    }
}

/// Remaining-life summary for a single pad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadLifeSummary {
    /// Pad type identifier, as keyed by the persistence layer.
    pub pad_type: String,
    /// Cumulative usage in seconds, bounded by the maximum lifetime.
    pub usage_seconds: u32,
    /// Remaining life percentage (0-100).
    pub remaining_percentage: u8,
    /// Whether the replacement warning threshold has been crossed.
    pub replacement_due: bool,
}

/// Pad-life evaluator.
#[derive(Debug, Clone, Default)]
pub struct PadLife {
    config: PadLifeConfig,
}

impl PadLife {
    /// Create an evaluator with the given configuration.
    pub fn new(config: PadLifeConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PadLifeConfig {
        &self.config
    }

    /// Remaining life percentage for a cumulative usage, rounded to the
    /// nearest integer and clamped to 0-100.
    pub fn remaining_percentage(&self, usage_seconds: u32) -> u8 {
        let max = self.config.max_lifetime_seconds as f64;
        let used = usage_seconds as f64 * 100.0 / max;
        (100.0 - used).round().clamp(0.0, 100.0) as u8
    }

    /// Whether the replacement warning threshold has been crossed.
    ///
    /// Strict comparison: a pad at exactly the warning percentage is not
    /// yet due.
    pub fn threshold_reached(&self, usage_seconds: u32) -> bool {
        self.remaining_percentage(usage_seconds) < self.config.warning_percentage
    }

    /// Add a session's duration to a pad's cumulative usage.
    ///
    /// The result is capped at the maximum lifetime. A negative duration
    /// is rejected with [`Error::NegativeSessionDuration`].
    pub fn update_usage(&self, previous_seconds: u32, session_duration: i64) -> Result<u32> {
        if session_duration < 0 {
            return Err(Error::NegativeSessionDuration {
                seconds: session_duration,
            });
        }
        let total = previous_seconds as u64 + session_duration as u64;
        Ok(total.min(self.config.max_lifetime_seconds as u64) as u32)
    }

    /// Summarize every pad in a usage mapping, sorted by pad type.
    pub fn summarize(&self, usage: &HashMap<String, u32>) -> Vec<PadLifeSummary> {
        let mut summaries: Vec<PadLifeSummary> = usage
            .iter()
            .map(|(pad_type, &usage_seconds)| PadLifeSummary {
                pad_type: pad_type.clone(),
                usage_seconds: usage_seconds.min(self.config.max_lifetime_seconds),
                remaining_percentage: self.remaining_percentage(usage_seconds),
                replacement_due: self.threshold_reached(usage_seconds),
            })
            .collect();
        summaries.sort_by(|a, b| a.pad_type.cmp(&b.pad_type));
        summaries
    }

    /// Pad types whose replacement warning threshold has been crossed.
    pub fn needs_replacement(&self, usage: &HashMap<String, u32>) -> Vec<String> {
        let mut due: Vec<String> = usage
            .iter()
            .filter(|&(_, &usage_seconds)| self.threshold_reached(usage_seconds))
            .map(|(pad_type, _)| pad_type.clone())
            .collect();
        due.sort();
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_percentage_endpoints() {
        let padlife = PadLife::default();
        assert_eq!(padlife.remaining_percentage(0), 100);
        assert_eq!(padlife.remaining_percentage(14_400), 50);
        assert_eq!(padlife.remaining_percentage(28_800), 0);
    }

    #[test]
    fn test_remaining_percentage_rounds_to_nearest() {
        let padlife = PadLife::default();
        // 1000 seconds used: 100 - 3.47 = 96.53 -> 97
        assert_eq!(padlife.remaining_percentage(1000), 97);
        // 28000 seconds used: 100 - 97.22 = 2.78 -> 3
        assert_eq!(padlife.remaining_percentage(28_000), 3);
    }

    #[test]
    fn test_remaining_percentage_clamps_overrun() {
        let padlife = PadLife::default();
        assert_eq!(padlife.remaining_percentage(50_000), 0);
    }

    #[test]
    fn test_threshold_strict_at_boundary() {
        let padlife = PadLife::default();
        // 24_480 seconds used leaves exactly 15%
        assert_eq!(padlife.remaining_percentage(24_480), 15);
        assert!(!padlife.threshold_reached(24_480));
        // One more percent of wear crosses the threshold
        assert!(padlife.threshold_reached(24_800));
    }

    #[test]
    fn test_threshold_matches_percentage() {
        let padlife = PadLife::default();
        for usage in (0..=30_000).step_by(500) {
            assert_eq!(
                padlife.threshold_reached(usage),
                padlife.remaining_percentage(usage) < REPLACEMENT_WARNING_PERCENTAGE,
                "usage {}",
                usage
            );
        }
    }

    #[test]
    fn test_update_usage_accumulates() {
        let padlife = PadLife::default();
        assert_eq!(padlife.update_usage(1000, 1800).unwrap(), 2800);
        assert_eq!(padlife.update_usage(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_update_usage_caps_at_lifetime() {
        let padlife = PadLife::default();
        assert_eq!(padlife.update_usage(28_000, 2000).unwrap(), 28_800);
        assert_eq!(padlife.update_usage(28_800, 1).unwrap(), 28_800);
        assert_eq!(padlife.update_usage(u32::MAX, i64::MAX).unwrap(), 28_800);
    }

    #[test]
    fn test_update_usage_rejects_negative_duration() {
        let padlife = PadLife::default();
        let result = padlife.update_usage(0, -1);
        assert!(matches!(
            result,
            Err(Error::NegativeSessionDuration { seconds: -1 })
        ));
    }

    #[test]
    fn test_summarize() {
        let padlife = PadLife::default();
        let usage = HashMap::from([
            ("knee-left".to_string(), 14_400u32),
            ("knee-right".to_string(), 28_000),
        ]);

        let summaries = padlife.summarize(&usage);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].pad_type, "knee-left");
        assert_eq!(summaries[0].remaining_percentage, 50);
        assert!(!summaries[0].replacement_due);
        assert_eq!(summaries[1].pad_type, "knee-right");
        assert_eq!(summaries[1].remaining_percentage, 3);
        assert!(summaries[1].replacement_due);
    }

    #[test]
    fn test_needs_replacement() {
        let padlife = PadLife::default();
        let usage = HashMap::from([
            ("knee-left".to_string(), 100u32),
            ("knee-right".to_string(), 28_500),
            ("thigh-left".to_string(), 27_000),
        ]);

        assert_eq!(
            padlife.needs_replacement(&usage),
            vec!["knee-right".to_string(), "thigh-left".to_string()]
        );
    }

    #[test]
    fn test_custom_config() {
        let padlife = PadLife::new(PadLifeConfig {
            max_lifetime_seconds: 1000,
            warning_percentage: 50,
        });

        assert_eq!(padlife.remaining_percentage(500), 50);
        assert!(!padlife.threshold_reached(500));
        assert!(padlife.threshold_reached(510));
        assert_eq!(padlife.update_usage(900, 500).unwrap(), 1000);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = PadLifeSummary {
            pad_type: "knee-left".to_string(),
            usage_seconds: 14_400,
            remaining_percentage: 50,
            replacement_due: false,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"remaining_percentage\":50"));
    }
}
