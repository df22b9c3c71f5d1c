//! Application constants and configuration values

/// Audio processing constants
pub mod audio {
    /// Upper clamp for the calibrated level
    pub const MAX_DB: u32 = 120;
    /// Offset mapping full-scale digital RMS to an approximate dB(SPL)
    pub const CALIBRATION_OFFSET_DB: f32 = 94.0;
    /// Samples per analysis frame
    pub const FFT_SIZE: usize = 256;
    /// Frequency bins reported per snapshot
    pub const FREQUENCY_BIN_COUNT: usize = FFT_SIZE / 2;
    /// Channel count requested from the input device
    pub const DEFAULT_CHANNELS: u16 = 1;
    /// Buffer size for audio streams
    pub const BUFFER_SIZE: cpal::BufferSize = cpal::BufferSize::Default;
}

/// Spectrum analyser constants
pub mod analyser {
    /// Weight of the previous frame in the magnitude average
    pub const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
    /// Magnitude mapped to byte 0
    pub const MIN_DECIBELS: f32 = -100.0;
    /// Magnitude mapped to byte 255
    pub const MAX_DECIBELS: f32 = -30.0;
}

/// Smoothing and debounce constants
pub mod smoothing {
    /// Raw levels averaged into one debounced level
    pub const SMOOTHING_SAMPLES: usize = 15;
    /// Minimum spacing between debounced emissions
    pub const UPDATE_INTERVAL_MS: u64 = 100;
    /// How long a loudness label must hold before it is displayed
    pub const LABEL_STABILITY_MS: u64 = 500;
}

/// Session statistics constants
pub mod session {
    /// Debounced levels kept for the history chart
    pub const HISTORY_LENGTH: usize = 60;
}

/// UI display constants
pub mod ui {
    /// Default redraw rate of the terminal meter
    pub const DEFAULT_FPS: u32 = 60;
    /// Highest accepted redraw rate
    pub const MAX_FPS: u32 = 240;
    /// Default number of frequency bars
    pub const FREQUENCY_BARS_COUNT: usize = 32;
    /// Bar width calculation accounts for borders
    pub const BAR_BORDER_WIDTH: usize = 2;
}
