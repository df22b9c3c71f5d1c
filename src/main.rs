mod analyser;
mod app;
mod audio;
mod config;
mod constants;
mod controller;
mod dsp;
mod error;
mod levels;
mod logging;
mod session;
mod smoothing;
mod stabilizer;
mod state;
mod ui;

use clap::Parser;
use dialoguer::{Select, theme::ColorfulTheme};

fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let device_list = audio::input_device_names()?;

    if device_list.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }

    // Interactive selection
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select an audio input device")
        .items(&device_list)
        .default(0)
        .interact()?;

    println!("{}", device_list[selection]);

    Ok(())
}

fn init_logging(config: &config::Config) -> logging::LogGuard {
    match logging::init(&config.log_target, config.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(app::ExitCode::Error as i32);
        }
    }
}

#[tokio::main]
async fn main() {
    use app::ExitCode;
    use config::{Args, Commands};

    let args = Args::parse();

    match args.command {
        Commands::Monitor(monitor_args) => {
            let config = match config::Config::from_monitor_args(monitor_args) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Configuration error: {}", e);
                    std::process::exit(ExitCode::Error as i32);
                }
            };
            let log_guard = init_logging(&config);

            let exit_code = match app::App::new_with_config(config) {
                Ok(app) => {
                    let run_result = app.run().await;
                    match run_result.result {
                        Ok(_) => run_result.exit_code,
                        Err(e) => {
                            tracing::error!("Application error: {}", e);
                            eprintln!("Application error: {}", e);
                            ExitCode::Error
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Setup error: {}", e);
                    ExitCode::Error
                }
            };

            // Flush the log writer before exiting
            drop(log_guard);
            std::process::exit(exit_code as i32);
        }
        Commands::List(_) => {
            if let Err(e) = list_devices() {
                eprintln!("Error listing devices: {}", e);
                std::process::exit(ExitCode::Error as i32);
            }
        }
        Commands::Report(report_args) => {
            let config = match config::Config::from_report_args(&report_args) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Configuration error: {}", e);
                    std::process::exit(ExitCode::Error as i32);
                }
            };
            let log_guard = init_logging(&config);

            match app::run_report(&config).await {
                Ok(readout) => {
                    if report_args.quiet {
                        println!("{}", readout.peak_decibels);
                        println!("{}", readout.avg_decibels);
                    } else {
                        println!("Session: {}", ui::format_time(readout.session_time));
                        println!(
                            "Peak: {} dB ({})",
                            readout.peak_decibels,
                            readout.peak_level().label
                        );
                        println!("Average: {} dB", readout.avg_decibels);
                        println!("Level: {}", readout.display_level.label);
                    }
                }
                Err(e) => {
                    eprintln!("Error during monitoring: {}", e);
                    drop(log_guard);
                    std::process::exit(ExitCode::Error as i32);
                }
            }
        }
    }
}
