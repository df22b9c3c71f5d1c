//! Dwell-time debounce for the displayed loudness label

use crate::levels::LoudnessBand;
use std::time::{Duration, Instant};

/// Where the stabilizer is in its commit cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilizerPhase {
    /// No candidate seen since the last reset
    Idle,
    /// A candidate is waiting out its dwell time
    PendingCandidate {
        candidate: &'static LoudnessBand,
        deadline: Instant,
    },
    /// The last candidate has been committed
    Stable,
}

/// Commits a loudness band only after it has been the classifier's output
/// for the whole dwell time
pub struct LabelStabilizer {
    dwell: Duration,
    phase: StabilizerPhase,
    last_candidate: Option<&'static LoudnessBand>,
    displayed: Option<&'static LoudnessBand>,
}

impl LabelStabilizer {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            phase: StabilizerPhase::Idle,
            last_candidate: None,
            displayed: None,
        }
    }

    /// Feed the band classified for the latest debounced level
    ///
    /// A band whose label differs from the previous candidate restarts the
    /// dwell timer. Returns the newly displayed band if a pending deadline had
    /// already passed at `now`.
    pub fn observe(
        &mut self,
        candidate: &'static LoudnessBand,
        now: Instant,
    ) -> Option<&'static LoudnessBand> {
        let committed = self.poll(now);

        if self.last_candidate.map(|band| band.label) != Some(candidate.label) {
            self.last_candidate = Some(candidate);
            self.phase = StabilizerPhase::PendingCandidate {
                candidate,
                deadline: now + self.dwell,
            };
        }

        committed
    }

    /// Fire the dwell timer if its deadline has passed
    ///
    /// Returns the band only when the displayed label actually changes.
    pub fn poll(&mut self, now: Instant) -> Option<&'static LoudnessBand> {
        let StabilizerPhase::PendingCandidate { candidate, deadline } = self.phase else {
            return None;
        };
        if now < deadline {
            return None;
        }

        self.phase = StabilizerPhase::Stable;
        let changed = self.displayed.map(|band| band.label) != Some(candidate.label);
        self.displayed = Some(candidate);
        if changed {
            tracing::debug!(label = candidate.label, "loudness label committed");
            Some(candidate)
        } else {
            None
        }
    }

    /// Cancel any pending deadline and clear the displayed label
    pub fn reset(&mut self) {
        self.phase = StabilizerPhase::Idle;
        self.last_candidate = None;
        self.displayed = None;
    }

    pub fn displayed(&self) -> Option<&'static LoudnessBand> {
        self.displayed
    }

    #[cfg(test)]
    pub fn phase(&self) -> StabilizerPhase {
        self.phase
    }
}
