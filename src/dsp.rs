//! Per-frame level and spectrum reduction

use crate::constants::audio::{CALIBRATION_OFFSET_DB, MAX_DB};

/// Compute the root-mean-square amplitude of a frame
///
/// Non-finite samples count as silence. An empty frame has an RMS of 0.
pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = frame
        .iter()
        .map(|&s| if s.is_finite() { s * s } else { 0.0 })
        .sum();

    (sum_squares / frame.len() as f32).sqrt()
}

/// Convert one time-domain frame into a calibrated level in `[0, MAX_DB]`
///
/// The 94 dB offset maps a full-scale RMS of 1.0 onto a rough dB(SPL)
/// reading. Silence returns 0 rather than negative infinity.
pub fn estimate_decibels(frame: &[f32]) -> u32 {
    let rms = rms(frame);
    if rms <= 0.0 {
        return 0;
    }

    let db = (20.0 * rms.log10() + CALIBRATION_OFFSET_DB).round();
    db.clamp(0.0, MAX_DB as f32) as u32
}

/// Reduce a byte magnitude snapshot to `bucket_count` bars in `[0, 1]`
///
/// Bins past `bucket_count * step` are dropped. A snapshot shorter than
/// `bucket_count` yields all-zero bars.
pub fn summarize_spectrum(snapshot: &[u8], bucket_count: usize) -> Vec<f32> {
    if bucket_count == 0 {
        return Vec::new();
    }

    let step = snapshot.len() / bucket_count;
    if step == 0 {
        return vec![0.0; bucket_count];
    }

    snapshot
        .chunks_exact(step)
        .take(bucket_count)
        .map(|slice| {
            let sum: u32 = slice.iter().map(|&m| m as u32).sum();
            sum as f32 / step as f32 / 255.0
        })
        .collect()
}
