//! Read-model published to the presentation layer

use crate::constants::{session::HISTORY_LENGTH, ui::FREQUENCY_BARS_COUNT};
use crate::levels::{LoudnessBand, classify};

/// Message shown when the microphone cannot be opened
pub const MIC_DENIED_MESSAGE: &str =
    "Microphone access denied. Please allow microphone access to use this app.";

/// Snapshot of everything the meter shows, taken after each tick
#[derive(Debug, Clone)]
pub struct MeterReadout {
    pub decibels: u32,
    pub peak_decibels: u32,
    pub avg_decibels: u32,
    pub session_time: u64,
    pub frequency_bars: Vec<f32>,
    pub db_history: Vec<u32>,
    pub current_level: &'static LoudnessBand,
    /// Stabilized label, falling back to `current_level` until one commits
    pub display_level: &'static LoudnessBand,
    pub is_listening: bool,
    pub error: Option<String>,
}

impl MeterReadout {
    /// Band for the session peak
    pub fn peak_level(&self) -> &'static LoudnessBand {
        classify(self.peak_decibels)
    }

    /// Position of the current level on the meter, `0.0..=1.0`
    pub fn display_ratio(&self) -> f64 {
        (self.decibels as f64 / crate::constants::audio::MAX_DB as f64).min(1.0)
    }
}

impl Default for MeterReadout {
    fn default() -> Self {
        Self {
            decibels: 0,
            peak_decibels: 0,
            avg_decibels: 0,
            session_time: 0,
            frequency_bars: vec![0.0; FREQUENCY_BARS_COUNT],
            db_history: vec![0; HISTORY_LENGTH],
            current_level: classify(0),
            display_level: classify(0),
            is_listening: false,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ratio_is_capped() {
        let readout = MeterReadout {
            decibels: 60,
            ..MeterReadout::default()
        };
        assert!((readout.display_ratio() - 0.5).abs() < 1e-9);

        let readout = MeterReadout {
            decibels: 500,
            ..MeterReadout::default()
        };
        assert_eq!(readout.display_ratio(), 1.0);
    }

    #[test]
    fn test_peak_level_follows_peak() {
        let readout = MeterReadout {
            peak_decibels: 100,
            ..MeterReadout::default()
        };
        assert_eq!(readout.peak_level().label, "Dangerously loud");
    }
}
