//! Configuration parsing and validation

use crate::constants::{audio::FREQUENCY_BIN_COUNT, ui};
use crate::controller::MeterSettings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Command line arguments for the noisemeter application
#[derive(Parser)]
#[command(name = "noisemeter")]
#[command(about = "Ambient noise meter with live spectrum and session statistics")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the live meter in the terminal
    Monitor(MonitorArgs),
    /// List available audio input devices
    List(ListArgs),
    /// Listen for a fixed time and report peak and average levels
    Report(ReportArgs),
}

#[derive(Parser)]
pub struct MonitorArgs {
    /// Audio input device name (optional, uses default if not specified)
    #[arg(long)]
    pub device: Option<String>,

    /// Meter redraw rate in frames per second
    #[arg(long, default_value_t = ui::DEFAULT_FPS)]
    pub fps: u32,

    /// Number of frequency bars
    #[arg(long, default_value_t = ui::FREQUENCY_BARS_COUNT)]
    pub bars: usize,

    /// Open the meter without starting the microphone
    #[arg(long)]
    pub paused: bool,

    /// Write logs to this file (the terminal is taken by the meter)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level (RUST_LOG overrides)
    #[arg(long, default_value_t = LevelFilter::INFO)]
    pub log_level: LevelFilter,
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Listening duration in seconds
    #[arg(long)]
    pub seconds: f32,

    /// Audio input device name (optional, uses default if not specified)
    #[arg(long)]
    pub device: Option<String>,

    /// Output only the integer values without labels
    #[arg(long)]
    pub quiet: bool,

    /// Log level for stderr output (RUST_LOG overrides)
    #[arg(long, default_value_t = LevelFilter::WARN)]
    pub log_level: LevelFilter,
}

#[derive(Parser)]
pub struct ListArgs {}

/// Where log output should go
#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    /// Nothing is logged
    Disabled,
    Stderr,
    File(PathBuf),
}

/// Application configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct Config {
    pub device_name: Option<String>,
    pub frame_interval: Duration,
    pub bucket_count: usize,
    pub autostart: bool,
    pub duration: Option<Duration>,
    pub log_target: LogTarget,
    pub log_level: LevelFilter,
}

impl Config {
    /// Create configuration from monitor arguments
    pub fn from_monitor_args(args: MonitorArgs) -> Result<Self, String> {
        if args.fps == 0 || args.fps > ui::MAX_FPS {
            return Err(format!(
                "FPS must be between 1 and {}, got {}",
                ui::MAX_FPS,
                args.fps
            ));
        }

        validate_bars(args.bars)?;

        Ok(Config {
            device_name: args.device,
            frame_interval: Duration::from_secs_f64(1.0 / args.fps as f64),
            bucket_count: args.bars,
            autostart: !args.paused,
            duration: None,
            log_target: args.log_file.map_or(LogTarget::Disabled, LogTarget::File),
            log_level: args.log_level,
        })
    }

    /// Create configuration from report arguments
    pub fn from_report_args(args: &ReportArgs) -> Result<Self, String> {
        if !args.seconds.is_finite() || args.seconds <= 0.0 {
            return Err("Seconds must be positive".into());
        }
        let duration = Duration::try_from_secs_f32(args.seconds)
            .map_err(|_| format!("Seconds value {} is too large", args.seconds))?;

        Ok(Config {
            device_name: args.device.clone(),
            frame_interval: Duration::from_secs_f64(1.0 / ui::DEFAULT_FPS as f64),
            bucket_count: ui::FREQUENCY_BARS_COUNT,
            autostart: true,
            duration: Some(duration),
            log_target: LogTarget::Stderr,
            log_level: args.log_level,
        })
    }

    /// Meter timing derived from this configuration
    pub fn meter_settings(&self) -> MeterSettings {
        MeterSettings {
            bucket_count: self.bucket_count,
            ..MeterSettings::default()
        }
    }
}

fn validate_bars(bars: usize) -> Result<(), String> {
    if bars == 0 || bars > FREQUENCY_BIN_COUNT {
        return Err(format!(
            "Bars must be between 1 and {}, got {}",
            FREQUENCY_BIN_COUNT, bars
        ));
    }
    Ok(())
}
