//! Session statistics: peak, running average, elapsed time and history

use crate::constants::session::HISTORY_LENGTH;
use std::collections::VecDeque;
use std::time::Instant;

/// Aggregates debounced levels over one listening session
pub struct SessionAggregator {
    peak: u32,
    average: u32,
    elapsed_secs: u64,
    history: VecDeque<u32>,
    sample_total: u64,
    sample_count: u64,
    started_at: Instant,
}

impl SessionAggregator {
    pub fn new(now: Instant) -> Self {
        Self {
            peak: 0,
            average: 0,
            elapsed_secs: 0,
            history: VecDeque::from(vec![0; HISTORY_LENGTH]),
            sample_total: 0,
            sample_count: 0,
            started_at: now,
        }
    }

    /// Begin a fresh session at `now`, discarding all previous statistics
    pub fn start(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    /// Fold one debounced level into the statistics
    pub fn record(&mut self, debounced: u32, now: Instant) {
        self.peak = self.peak.max(debounced);

        self.sample_total += debounced as u64;
        self.sample_count += 1;
        self.average = (self.sample_total as f64 / self.sample_count as f64).round() as u32;

        self.history.pop_front();
        self.history.push_back(debounced);

        self.elapsed_secs = now.saturating_duration_since(self.started_at).as_secs();
    }

    pub fn reset_peak(&mut self) {
        self.peak = 0;
    }

    /// Zero every statistic and restart the session clock
    pub fn clear(&mut self, now: Instant) {
        self.start(now);
    }

    pub fn peak(&self) -> u32 {
        self.peak
    }

    pub fn average(&self) -> u32 {
        self.average
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[cfg(test)]
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Oldest first, always `HISTORY_LENGTH` entries
    pub fn history(&self) -> Vec<u32> {
        self.history.iter().copied().collect()
    }
}
