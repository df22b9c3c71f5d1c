//! Rolling-window smoothing of raw per-frame levels

use crate::constants::smoothing::SMOOTHING_SAMPLES;
use std::collections::VecDeque;

/// Averages the most recent raw levels into one debounced level
pub struct SmoothingWindow {
    samples: VecDeque<u32>,
    capacity: usize,
}

impl SmoothingWindow {
    /// Create a window holding at most `capacity` levels
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a raw level, evicting the oldest once the window is full
    pub fn push(&mut self, db: u32) {
        self.samples.push_back(db);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Rounded mean of the window, 0 when empty
    pub fn current(&self) -> u32 {
        if self.samples.is_empty() {
            return 0;
        }
        let sum: u64 = self.samples.iter().map(|&db| db as u64).sum();
        (sum as f64 / self.samples.len() as f64).round() as u32
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::new(SMOOTHING_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_reads_zero() {
        let window = SmoothingWindow::default();
        assert_eq!(window.current(), 0);
    }

    #[test]
    fn test_sixteen_identical_values() {
        let mut window = SmoothingWindow::default();
        for _ in 0..16 {
            window.push(50);
        }
        assert_eq!(window.len(), 15);
        assert_eq!(window.current(), 50);
    }

    #[test]
    fn test_only_recent_values_count() {
        let mut window = SmoothingWindow::default();
        for _ in 0..15 {
            window.push(120);
        }
        for _ in 0..15 {
            window.push(30);
        }
        assert_eq!(window.current(), 30);
    }

    #[test]
    fn test_mean_rounds_half_up() {
        let mut window = SmoothingWindow::new(2);
        window.push(60);
        window.push(61);
        assert_eq!(window.current(), 61);
    }

    #[test]
    fn test_reset_empties_window() {
        let mut window = SmoothingWindow::default();
        window.push(80);
        window.reset();
        assert_eq!(window.len(), 0);
        assert_eq!(window.current(), 0);
    }
}
