//! Sample ring and byte-scaled magnitude spectrum for the meter
//!
//! Keeps the most recent `fft_size` mono samples written by the capture
//! callback and, on demand, produces the time-domain frame and a smoothed,
//! byte-scaled magnitude spectrum of those samples.

use crate::constants::analyser::{MAX_DECIBELS, MIN_DECIBELS, SMOOTHING_TIME_CONSTANT};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

pub struct Analyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    ring: Vec<f32>,
    write_pos: usize,
    window: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
}

impl Analyser {
    /// Create an analyser over the last `fft_size` samples
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Blackman window
        let window = (0..fft_size)
            .map(|i| {
                let x = i as f32 / fft_size as f32;
                let tau = 2.0 * std::f32::consts::PI;
                0.42 - 0.5 * (tau * x).cos() + 0.08 * (2.0 * tau * x).cos()
            })
            .collect();

        Self {
            fft,
            fft_size,
            ring: vec![0.0; fft_size],
            write_pos: 0,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            smoothing: SMOOTHING_TIME_CONSTANT,
        }
    }

    #[cfg(test)]
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Append interleaved samples, averaging channels down to mono
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks(channels) {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            self.ring[self.write_pos] = if mono.is_finite() { mono } else { 0.0 };
            self.write_pos = (self.write_pos + 1) % self.fft_size;
        }
    }

    /// Copy the latest samples, oldest first, into `out`
    ///
    /// Only `min(out.len(), fft_size)` samples are written.
    pub fn time_domain(&self, out: &mut [f32]) {
        let n = out.len().min(self.fft_size);
        let start = (self.write_pos + self.fft_size - n) % self.fft_size;
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = self.ring[(start + i) % self.fft_size];
        }
    }

    /// Compute smoothed magnitudes scaled to `0..=255` into `out`
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        for i in 0..self.fft_size {
            let sample = self.ring[(self.write_pos + i) % self.fft_size];
            self.fft_buffer[i] = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.fft_buffer);

        let scale = 1.0 / self.fft_size as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.fft_buffer[k].norm() * scale;
            let value = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;
            *smoothed = if value.is_finite() { value } else { 0.0 };
        }

        for (slot, &magnitude) in out.iter_mut().zip(self.smoothed.iter()) {
            *slot = if magnitude > 0.0 {
                let db = 20.0 * magnitude.log10();
                (255.0 / range * (db - MIN_DECIBELS)).clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }
}
