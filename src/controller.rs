//! Acquisition loop: start/stop lifecycle and the per-frame update cadence

use crate::audio::{AudioBackend, CaptureStream};
use crate::constants::{smoothing, ui::FREQUENCY_BARS_COUNT};
use crate::dsp::{estimate_decibels, summarize_spectrum};
use crate::error::{AppError, AppResult};
use crate::levels::classify;
use crate::session::SessionAggregator;
use crate::smoothing::SmoothingWindow;
use crate::stabilizer::LabelStabilizer;
use crate::state::{MIC_DENIED_MESSAGE, MeterReadout};
use std::time::{Duration, Instant};

/// Lifecycle phase of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Permission to run exactly one frame
///
/// Each tick consumes the token it was given and hands back the next one.
/// `stop` invalidates whatever token is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken(u64);

/// Timing knobs for the meter
#[derive(Debug, Clone)]
pub struct MeterSettings {
    pub update_interval: Duration,
    pub label_dwell: Duration,
    pub smoothing_samples: usize,
    pub bucket_count: usize,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(smoothing::UPDATE_INTERVAL_MS),
            label_dwell: Duration::from_millis(smoothing::LABEL_STABILITY_MS),
            smoothing_samples: smoothing::SMOOTHING_SAMPLES,
            bucket_count: FREQUENCY_BARS_COUNT,
        }
    }
}

/// Owns the capture stream and every piece of per-session state
pub struct MeterController<B: AudioBackend> {
    backend: B,
    capture: Option<B::Capture>,
    state: ListenState,
    settings: MeterSettings,
    next_frame: Option<FrameToken>,
    frame_counter: u64,
    last_update: Option<Instant>,
    time_buffer: Vec<f32>,
    freq_buffer: Vec<u8>,
    window: SmoothingWindow,
    session: SessionAggregator,
    stabilizer: LabelStabilizer,
    decibels: u32,
    frequency_bars: Vec<f32>,
    error: Option<String>,
}

impl<B: AudioBackend> MeterController<B> {
    pub fn new(backend: B, settings: MeterSettings, now: Instant) -> Self {
        Self {
            backend,
            capture: None,
            state: ListenState::Stopped,
            next_frame: None,
            frame_counter: 0,
            last_update: None,
            time_buffer: Vec::new(),
            freq_buffer: Vec::new(),
            window: SmoothingWindow::new(settings.smoothing_samples),
            session: SessionAggregator::new(now),
            stabilizer: LabelStabilizer::new(settings.label_dwell),
            decibels: 0,
            frequency_bars: vec![0.0; settings.bucket_count],
            error: None,
            settings,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ListenState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == ListenState::Running
    }

    /// Open the microphone and begin a new session
    ///
    /// Calling this while already running returns the outstanding token and
    /// never reopens the microphone.
    /// On failure the controller stays stopped and the read-model carries
    /// the denial message.
    pub fn start(&mut self, now: Instant) -> AppResult<FrameToken> {
        if self.state != ListenState::Stopped {
            tracing::debug!(state = ?self.state, "start ignored, not stopped");
            return self.next_frame.ok_or(AppError::AlreadyListening);
        }

        self.state = ListenState::Starting;
        self.error = None;

        let capture = match self.backend.acquire() {
            Ok(capture) => capture,
            Err(e) => {
                tracing::warn!("Microphone unavailable: {}", e);
                self.error = Some(MIC_DENIED_MESSAGE.to_string());
                self.state = ListenState::Stopped;
                return Err(e);
            }
        };

        self.time_buffer = vec![0.0; capture.frame_len()];
        self.freq_buffer = vec![0; capture.bin_count()];
        self.capture = Some(capture);

        self.window.reset();
        self.session.start(now);
        self.stabilizer.reset();
        self.decibels = 0;
        self.last_update = None;

        self.state = ListenState::Running;
        tracing::info!("listening started");
        Ok(self.arm_next_frame())
    }

    /// Run one frame
    ///
    /// Returns the token for the next frame, or `None` when `token` is stale
    /// or the controller is not running.
    pub fn tick(&mut self, token: FrameToken, now: Instant) -> Option<FrameToken> {
        if self.state != ListenState::Running || self.next_frame != Some(token) {
            return None;
        }
        self.next_frame = None;

        self.poll_timers(now);

        let capture = self.capture.as_mut()?;
        capture.time_domain(&mut self.time_buffer);
        capture.frequency_data(&mut self.freq_buffer);

        self.window.push(estimate_decibels(&self.time_buffer));
        self.frequency_bars = summarize_spectrum(&self.freq_buffer, self.settings.bucket_count);

        let due = self
            .last_update
            .is_none_or(|last| now.saturating_duration_since(last) >= self.settings.update_interval);
        if due {
            self.last_update = Some(now);
            let debounced = self.window.current();
            self.decibels = debounced;
            self.session.record(debounced, now);
            self.stabilizer.observe(classify(debounced), now);
        }

        Some(self.arm_next_frame())
    }

    /// Fire the label dwell timer if it has expired
    pub fn poll_timers(&mut self, now: Instant) {
        if self.state == ListenState::Running {
            self.stabilizer.poll(now);
        }
    }

    /// Cancel the frame loop and the dwell timer, then release the microphone
    ///
    /// Peak, average, elapsed time and history are kept until the next start
    /// or an explicit clear.
    pub fn stop(&mut self) {
        if self.state == ListenState::Stopped {
            return;
        }
        self.state = ListenState::Stopping;

        self.next_frame = None;
        self.stabilizer.reset();

        if let Some(capture) = self.capture.take() {
            capture.release();
        }

        self.window.reset();
        self.frequency_bars = vec![0.0; self.settings.bucket_count];
        self.last_update = None;

        self.state = ListenState::Stopped;
        tracing::info!(
            peak = self.session.peak(),
            average = self.session.average(),
            seconds = self.session.elapsed_secs(),
            "listening stopped"
        );
    }

    pub fn reset_peak(&mut self) {
        self.session.reset_peak();
    }

    /// Wipe all statistics regardless of the listening state
    pub fn clear_session(&mut self, now: Instant) {
        self.session.clear(now);
        self.window.reset();
        self.stabilizer.reset();
        self.decibels = 0;
        self.frequency_bars = vec![0.0; self.settings.bucket_count];
        tracing::debug!("session cleared");
    }

    pub fn readout(&self) -> MeterReadout {
        let current_level = classify(self.decibels);
        MeterReadout {
            decibels: self.decibels,
            peak_decibels: self.session.peak(),
            avg_decibels: self.session.average(),
            session_time: self.session.elapsed_secs(),
            frequency_bars: self.frequency_bars.clone(),
            db_history: self.session.history(),
            current_level,
            display_level: self.stabilizer.displayed().unwrap_or(current_level),
            is_listening: self.is_listening(),
            error: self.error.clone(),
        }
    }

    fn arm_next_frame(&mut self) -> FrameToken {
        self.frame_counter += 1;
        let token = FrameToken(self.frame_counter);
        self.next_frame = Some(token);
        token
    }
}

impl<B: AudioBackend> Drop for MeterController<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::session::HISTORY_LENGTH;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Produces a constant-amplitude frame and a flat spectrum
    #[derive(Clone, Default)]
    struct FakeMic {
        amplitude: Rc<RefCell<f32>>,
        magnitude: Rc<RefCell<u8>>,
        acquired: Rc<RefCell<u32>>,
        released: Rc<RefCell<u32>>,
        deny: bool,
    }

    impl FakeMic {
        fn set_amplitude(&self, amplitude: f32) {
            *self.amplitude.borrow_mut() = amplitude;
        }
    }

    struct FakeCapture(FakeMic);

    impl AudioBackend for FakeMic {
        type Capture = FakeCapture;

        fn acquire(&mut self) -> AppResult<FakeCapture> {
            if self.deny {
                return Err(AppError::CapabilityDenied("permission refused".to_string()));
            }
            *self.acquired.borrow_mut() += 1;
            Ok(FakeCapture(self.clone()))
        }
    }

    impl CaptureStream for FakeCapture {
        fn frame_len(&self) -> usize {
            256
        }

        fn bin_count(&self) -> usize {
            128
        }

        fn time_domain(&mut self, out: &mut [f32]) {
            out.fill(*self.0.amplitude.borrow());
        }

        fn frequency_data(&mut self, out: &mut [u8]) {
            out.fill(*self.0.magnitude.borrow());
        }

        fn release(self) {
            *self.0.released.borrow_mut() += 1;
        }
    }

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    /// Drive frames every 16ms from `from` until `until`, returning the last token
    fn run_frames(
        controller: &mut MeterController<FakeMic>,
        mut token: FrameToken,
        start: Instant,
        from: u64,
        until: u64,
    ) -> FrameToken {
        let mut t = from;
        while t <= until {
            token = controller.tick(token, ms(start, t)).expect("controller stopped");
            t += 16;
        }
        token
    }

    #[test]
    fn test_start_runs_and_stop_releases() {
        let start = Instant::now();
        let mic = FakeMic::default();
        let mut controller = MeterController::new(mic.clone(), MeterSettings::default(), start);

        let token = controller.start(start).unwrap();
        assert_eq!(controller.state(), ListenState::Running);
        assert!(controller.readout().is_listening);

        controller.tick(token, ms(start, 16)).unwrap();
        controller.stop();
        assert_eq!(controller.state(), ListenState::Stopped);
        assert_eq!(*mic.released.borrow(), 1);

        // Idempotent
        controller.stop();
        assert_eq!(*mic.released.borrow(), 1);
    }

    #[test]
    fn test_denied_microphone_leaves_session_untouched() {
        let start = Instant::now();
        let mic = FakeMic {
            deny: true,
            ..FakeMic::default()
        };
        let mut controller = MeterController::new(mic, MeterSettings::default(), start);

        let result = controller.start(start);
        assert!(matches!(result, Err(AppError::CapabilityDenied(_))));
        assert_eq!(controller.state(), ListenState::Stopped);

        let readout = controller.readout();
        assert_eq!(readout.error.as_deref(), Some(MIC_DENIED_MESSAGE));
        assert!(!readout.is_listening);
        assert_eq!(readout.db_history, vec![0; HISTORY_LENGTH]);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let start = Instant::now();
        let mut controller = MeterController::new(FakeMic::default(), MeterSettings::default(), start);
        let first = controller.start(start).unwrap();
        let second = controller.start(ms(start, 5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_start_never_reopens_an_open_session() {
        let start = Instant::now();
        let mic = FakeMic::default();
        let mut controller = MeterController::new(mic.clone(), MeterSettings::default(), start);
        controller.start(start).unwrap();

        // Running with no frame outstanding, as inside a tick
        controller.next_frame = None;
        let result = controller.start(ms(start, 5));
        assert!(matches!(result, Err(AppError::AlreadyListening)));
        assert_eq!(*mic.acquired.borrow(), 1);
        assert_eq!(*mic.released.borrow(), 0);
        assert_eq!(controller.state(), ListenState::Running);
    }

    #[test]
    fn test_stale_token_is_ignored_after_stop() {
        let start = Instant::now();
        let mic = FakeMic::default();
        mic.set_amplitude(0.1);
        let mut controller = MeterController::new(mic, MeterSettings::default(), start);

        let token = controller.start(start).unwrap();
        controller.stop();
        assert!(controller.tick(token, ms(start, 200)).is_none());
        assert_eq!(controller.readout().decibels, 0);
    }

    #[test]
    fn test_consumed_token_cannot_be_reused() {
        let start = Instant::now();
        let mut controller = MeterController::new(FakeMic::default(), MeterSettings::default(), start);
        let token = controller.start(start).unwrap();
        let next = controller.tick(token, ms(start, 16)).unwrap();
        assert!(controller.tick(token, ms(start, 32)).is_none());
        assert!(controller.tick(next, ms(start, 32)).is_some());
    }

    #[test]
    fn test_updates_are_gated_to_cadence() {
        let start = Instant::now();
        let mic = FakeMic::default();
        mic.set_amplitude(0.1);
        let mut controller = MeterController::new(mic, MeterSettings::default(), start);

        let token = controller.start(start).unwrap();

        // The first frame after start is already due
        let token = controller.tick(token, ms(start, 16)).unwrap();
        let readout = controller.readout();
        assert_eq!(readout.decibels, 74);
        assert_eq!(readout.db_history[HISTORY_LENGTH - 1], 74);
        assert_eq!(readout.db_history[HISTORY_LENGTH - 2], 0);

        // Nothing more until 100ms after that emission
        let token = run_frames(&mut controller, token, start, 32, 112);
        assert_eq!(controller.readout().db_history[HISTORY_LENGTH - 2], 0);

        controller.tick(token, ms(start, 128)).unwrap();
        let history = controller.readout().db_history;
        assert_eq!(&history[HISTORY_LENGTH - 2..], &[74, 74]);
        assert_eq!(history[HISTORY_LENGTH - 3], 0);
    }

    #[test]
    fn test_frequency_bars_update_every_frame() {
        let start = Instant::now();
        let mic = FakeMic::default();
        *mic.magnitude.borrow_mut() = 255;
        let mut controller = MeterController::new(mic, MeterSettings::default(), start);

        let token = controller.start(start).unwrap();
        controller.tick(token, ms(start, 16)).unwrap();
        let bars = controller.readout().frequency_bars;
        assert_eq!(bars.len(), FREQUENCY_BARS_COUNT);
        assert!(bars.iter().all(|&b| (b - 1.0).abs() < 1e-6));

        controller.stop();
        assert!(controller.readout().frequency_bars.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_label_commits_after_dwell() {
        let start = Instant::now();
        let mic = FakeMic::default();
        mic.set_amplitude(0.1);
        let mut controller = MeterController::new(mic, MeterSettings::default(), start);

        let token = controller.start(start).unwrap();
        let token = run_frames(&mut controller, token, start, 16, 400);
        assert!(controller.stabilizer.displayed().is_none());
        // Falls back to the instantaneous band until one commits
        assert_eq!(controller.readout().display_level.label, "Getting louder...");

        run_frames(&mut controller, token, start, 416, 700);
        assert_eq!(
            controller.stabilizer.displayed().map(|b| b.label),
            Some("Getting louder...")
        );
    }

    #[test]
    fn test_brief_spike_does_not_change_label() {
        let start = Instant::now();
        let mic = FakeMic::default();
        mic.set_amplitude(0.001);
        let settings = MeterSettings {
            smoothing_samples: 1,
            ..MeterSettings::default()
        };
        let mut controller = MeterController::new(mic.clone(), settings, start);

        let token = controller.start(start).unwrap();
        let token = run_frames(&mut controller, token, start, 16, 800);
        assert_eq!(controller.readout().display_level.label, "Whisper quiet");

        mic.set_amplitude(1.0);
        let token = run_frames(&mut controller, token, start, 816, 1_000);
        mic.set_amplitude(0.001);
        run_frames(&mut controller, token, start, 1_016, 2_000);
        assert_eq!(
            controller.stabilizer.displayed().map(|b| b.label),
            Some("Whisper quiet")
        );
    }

    #[test]
    fn test_stop_keeps_stats_and_start_resets_them() {
        let start = Instant::now();
        let mic = FakeMic::default();
        mic.set_amplitude(0.1);
        let mut controller = MeterController::new(mic, MeterSettings::default(), start);

        let token = controller.start(start).unwrap();
        run_frames(&mut controller, token, start, 16, 1_200);
        controller.stop();

        let readout = controller.readout();
        assert!(!readout.is_listening);
        assert!(readout.peak_decibels > 0);
        assert!(readout.avg_decibels > 0);
        assert_eq!(readout.session_time, 1);
        assert!(readout.db_history.iter().any(|&db| db > 0));

        controller.start(ms(start, 5_000)).unwrap();
        let readout = controller.readout();
        assert_eq!(readout.peak_decibels, 0);
        assert_eq!(readout.avg_decibels, 0);
        assert_eq!(readout.db_history, vec![0; HISTORY_LENGTH]);
    }

    #[test]
    fn test_reset_peak_and_clear_session() {
        let start = Instant::now();
        let mic = FakeMic::default();
        mic.set_amplitude(0.1);
        let mut controller = MeterController::new(mic, MeterSettings::default(), start);

        let token = controller.start(start).unwrap();
        run_frames(&mut controller, token, start, 16, 2_100);

        controller.reset_peak();
        let readout = controller.readout();
        assert_eq!(readout.peak_decibels, 0);
        assert!(readout.avg_decibels > 0);

        controller.stop();
        controller.clear_session(ms(start, 3_000));
        let readout = controller.readout();
        assert_eq!(readout.peak_decibels, 0);
        assert_eq!(readout.avg_decibels, 0);
        assert_eq!(readout.session_time, 0);
        assert_eq!(readout.decibels, 0);
        assert_eq!(readout.db_history, vec![0; HISTORY_LENGTH]);
    }

    #[test]
    fn test_clear_while_running_keeps_listening() {
        let start = Instant::now();
        let mic = FakeMic::default();
        mic.set_amplitude(0.1);
        let mut controller = MeterController::new(mic, MeterSettings::default(), start);

        let token = controller.start(start).unwrap();
        let token = run_frames(&mut controller, token, start, 16, 500);
        controller.clear_session(ms(start, 510));
        assert!(controller.is_listening());
        assert!(controller.tick(token, ms(start, 526)).is_some());
    }
}
