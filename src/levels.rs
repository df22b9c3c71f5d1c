//! Loudness bands and the level classifier

/// Colour family used when rendering a band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glow {
    Cyan,
    Yellow,
    Orange,
    Red,
}

/// One entry of the loudness catalog
#[derive(Debug, PartialEq)]
pub struct LoudnessBand {
    /// Inclusive upper bound in dB, `f32::INFINITY` for the catch-all
    pub upper_bound_db: f32,
    pub label: &'static str,
    pub style_tag: Glow,
}

/// Loudness catalog ordered by ascending bound
pub static NOISE_LEVELS: [LoudnessBand; 8] = [
    LoudnessBand { upper_bound_db: 40.0, label: "Whisper quiet", style_tag: Glow::Cyan },
    LoudnessBand { upper_bound_db: 55.0, label: "Nice and peaceful", style_tag: Glow::Cyan },
    LoudnessBand { upper_bound_db: 65.0, label: "Normal conversation", style_tag: Glow::Yellow },
    LoudnessBand { upper_bound_db: 75.0, label: "Getting louder...", style_tag: Glow::Orange },
    LoudnessBand { upper_bound_db: 85.0, label: "Pretty loud!", style_tag: Glow::Orange },
    LoudnessBand { upper_bound_db: 95.0, label: "Very loud!", style_tag: Glow::Red },
    LoudnessBand { upper_bound_db: 105.0, label: "Dangerously loud", style_tag: Glow::Red },
    LoudnessBand { upper_bound_db: f32::INFINITY, label: "Hearing damage risk", style_tag: Glow::Red },
];

/// Everyday sounds shown next to the session statistics
pub static REFERENCE_GUIDE: [(&str, u32, Glow); 5] = [
    ("Whisper", 30, Glow::Cyan),
    ("Conversation", 60, Glow::Cyan),
    ("Vacuum", 70, Glow::Yellow),
    ("Heavy Traffic", 85, Glow::Orange),
    ("Concert", 110, Glow::Red),
];

/// Colour legend under the main meter
pub static LEGEND: [(&str, Glow); 4] = [
    ("Quiet", Glow::Cyan),
    ("Normal", Glow::Yellow),
    ("Loud", Glow::Orange),
    ("Danger", Glow::Red),
];

/// Map a decibel level to the first band whose bound covers it
pub fn classify(db: u32) -> &'static LoudnessBand {
    let value = db as f32;
    NOISE_LEVELS
        .iter()
        .find(|band| value <= band.upper_bound_db)
        .unwrap_or(&NOISE_LEVELS[NOISE_LEVELS.len() - 1])
}
