//! Main application logic and orchestration

use crate::audio::CpalBackend;
use crate::config::Config;
use crate::controller::{FrameToken, MeterController};
use crate::error::{AppError, AppResult};
use crate::state::MeterReadout;
use crate::ui;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

/// Exit codes for the application
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Success = 0,
    UserExit = 1, // Interrupted with Ctrl+C
    Error = 2,
}

/// Result type that includes user exit information
pub type AppRunResult = Result<(), AppError>;

/// Extended result that tracks exit reason
pub struct RunResult {
    pub result: AppRunResult,
    pub exit_code: ExitCode,
}

/// What a key press asks the meter to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleListening,
    ResetPeak,
    ClearSession,
    Quit,
    Interrupt,
}

/// Map a key press to a meter command
pub fn command_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    match code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(Command::ToggleListening),
        KeyCode::Char('r') => Some(Command::ResetPeak),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Interrupt),
        KeyCode::Char('c') => Some(Command::ClearSession),
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

/// Interactive terminal meter
pub struct App {
    config: Config,
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
}

impl App {
    /// Take over the terminal for the meter
    pub fn new_with_config(config: Config) -> AppResult<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(App { config, terminal })
    }

    /// Run the meter until the user quits
    pub async fn run(mut self) -> RunResult {
        let result = self.event_loop().await;
        let _ = self.cleanup(); // Ignore cleanup errors

        match result {
            Ok(exit_code) => RunResult {
                result: Ok(()),
                exit_code,
            },
            Err(e) => RunResult {
                result: Err(e),
                exit_code: ExitCode::Error,
            },
        }
    }

    async fn event_loop(&mut self) -> AppResult<ExitCode> {
        let backend = CpalBackend::new(self.config.device_name.clone());
        let mut controller = MeterController::new(backend, self.config.meter_settings(), Instant::now());

        let mut token: Option<FrameToken> = None;
        if self.config.autostart {
            // A denial is shown in the meter; the user can retry with space
            token = controller.start(Instant::now()).ok();
        }

        let mut frames = tokio::time::interval(self.config.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let exit_reason = 'frames: loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break 'frames ExitCode::UserExit,
                _ = frames.tick() => {}
            }

            let now = Instant::now();
            if let Some(current) = token.take() {
                token = controller.tick(current, now);
            }

            let readout = controller.readout();
            self.terminal.draw(|f| ui::render_ui(f, &readout))?;

            while crossterm::event::poll(Duration::from_millis(0))? {
                let Event::Key(key_event) = crossterm::event::read()? else {
                    continue;
                };
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                match command_for_key(key_event.code, key_event.modifiers) {
                    Some(Command::ToggleListening) => {
                        if controller.is_listening() {
                            controller.stop();
                            token = None;
                        } else {
                            token = controller.start(Instant::now()).ok();
                        }
                    }
                    Some(Command::ResetPeak) => controller.reset_peak(),
                    Some(Command::ClearSession) => controller.clear_session(Instant::now()),
                    Some(Command::Quit) => break 'frames ExitCode::Success,
                    Some(Command::Interrupt) => break 'frames ExitCode::UserExit,
                    None => {}
                }
            }
        };

        controller.stop();
        Ok(exit_reason)
    }

    /// Clean up terminal state
    fn cleanup(mut self) -> AppResult<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

/// Listen without a UI for the configured duration and return the final readout
pub async fn run_report(config: &Config) -> AppResult<MeterReadout> {
    let duration = config
        .duration
        .ok_or_else(|| AppError::Config("Report needs a duration".to_string()))?;

    let backend = CpalBackend::new(config.device_name.clone());
    let started = Instant::now();
    let mut controller = MeterController::new(backend, config.meter_settings(), started);
    let mut token = Some(controller.start(started)?);

    let mut frames = tokio::time::interval(config.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = frames.tick() => {}
        }

        let now = Instant::now();
        if now.duration_since(started) >= duration {
            break;
        }
        match token.take() {
            Some(current) => token = controller.tick(current, now),
            None => break,
        }
    }

    let readout = controller.readout();
    controller.stop();
    Ok(readout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        let none = KeyModifiers::NONE;
        assert_eq!(command_for_key(KeyCode::Char(' '), none), Some(Command::ToggleListening));
        assert_eq!(command_for_key(KeyCode::Char('r'), none), Some(Command::ResetPeak));
        assert_eq!(command_for_key(KeyCode::Char('c'), none), Some(Command::ClearSession));
        assert_eq!(
            command_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Command::Interrupt)
        );
        assert_eq!(command_for_key(KeyCode::Esc, none), Some(Command::Quit));
        assert_eq!(command_for_key(KeyCode::Char('x'), none), None);
    }
}
