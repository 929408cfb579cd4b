//! amp-idle-daemon: idle-based power controller for an audio amplifier
//!
//! Watches the ALSA substreams for playback, powers the amplifier on when
//! audio starts and off again after a stretch of silence. The believed
//! power state is persisted after every change so reboots and power loss
//! resume the countdown where it left off.
//!
//! Modes:
//! - no flags: run the daemon loop until SIGINT/SIGTERM
//! - `--on` / `--off`: forced override actuation
//! - `--status`: print recorded state and time left before sleep

mod actuator;
mod cli;
mod config;
mod lifecycle;
mod probe;
mod state;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::actuator::SerialActuator;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::lifecycle::ShutdownSignal;
use crate::probe::AlsaProbe;
use crate::state::{now_secs, PowerController, StateStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args(std::env::args_os());

    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = Config::load()?;

    let store = StateStore::new(&config.state_path);
    let probe = AlsaProbe::new(&config.alsa_root);
    let actuator = SerialActuator::new(&config);
    let mut controller = PowerController::new(&config, store, probe, actuator, now_secs());

    match cli.command() {
        Command::Force { on } => {
            cli::force_power(&mut controller, on, &mut std::io::stdout())?;
        }
        Command::Status { json } => {
            cli::print_status(&controller, json, now_secs(), &mut std::io::stdout())?;
        }
        Command::Daemon => {
            info!(
                version = env!("CARGO_PKG_VERSION"),
                device = %config.device_path,
                "amp-idle-daemon starting"
            );

            let mut shutdown = ShutdownSignal::install();

            tokio::select! {
                _ = controller.run() => {}

                _ = shutdown.wait() => {
                    info!("shutdown signal received");
                }
            }

            info!("amp-idle-daemon stopped");
        }
    }

    Ok(())
}
