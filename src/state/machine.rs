//! Core power state machine
//!
//! Polls the activity probe once per tick, powers the amplifier on when
//! audio starts and off once it has been silent past the idle threshold.
//! Every change to the believed power state is persisted before the next
//! tick.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::store::{ControllerState, StateStore};
use crate::actuator::{ActuationError, PowerActuator};
use crate::config::Config;
use crate::probe::ActivityProbe;

/// Current wall-clock time in seconds since the UNIX epoch
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn power_label(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

/// Snapshot returned by [`PowerController::status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub state_file: String,
    pub power_on: bool,
    pub playing: bool,
    /// Whole seconds until auto-shutdown; only set while on and idle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_sleep_secs: Option<u64>,
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Amp Status ---")?;
        writeln!(f, "State File   : {}", self.state_file)?;
        writeln!(f, "Amp Power    : {}", power_label(self.power_on))?;
        write!(f, "Audio Playing: {}", if self.playing { "YES" } else { "NO" })?;
        if let Some(remaining) = self.time_to_sleep_secs {
            write!(f, "\nTime to Sleep: {}m {}s", remaining / 60, remaining % 60)?;
        }
        Ok(())
    }
}

/// Idle-based amplifier power controller
pub struct PowerController<P, A> {
    /// Persisted state
    state: ControllerState,
    store: StateStore,
    probe: P,
    actuator: A,
    idle_threshold: Duration,
    poll_interval: Duration,
    status_log_interval: Duration,
    /// Probe reading of the previous tick (for edge detection)
    was_playing: bool,
    /// When the idle countdown was last logged
    last_status_log: f64,
}

impl<P: ActivityProbe, A: PowerActuator> PowerController<P, A> {
    /// Create a controller, recovering its state from `store`
    pub fn new(config: &Config, store: StateStore, probe: P, actuator: A, now: f64) -> Self {
        let state = store.load(now);
        Self {
            state,
            store,
            probe,
            actuator,
            idle_threshold: config.idle_threshold,
            poll_interval: config.poll_interval,
            status_log_interval: config.status_log_interval,
            was_playing: false,
            last_status_log: 0.0,
        }
    }

    /// Get the persisted part of the state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Run the polling loop forever
    pub async fn run(&mut self) {
        info!(state_file = ?self.store.path(), "daemon mode: tracking state");
        info!(
            idle_minutes = self.idle_threshold.as_secs() / 60,
            "idle limit set"
        );

        loop {
            self.tick(now_secs());
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Evaluate one poll tick at wall-clock time `now`
    pub fn tick(&mut self, now: f64) {
        let playing = self.is_playing();

        if playing {
            self.state.last_active = now;

            if !self.state.power_on {
                info!("audio detected, powering up");
                if let Err(e) = self.toggle(true, false) {
                    error!(error = %e, "power-up failed, will retry next tick");
                }
            }

            if !self.was_playing {
                info!("audio playback active, idle timer paused");
                self.persist();
                self.was_playing = true;
            }
        } else {
            if self.was_playing {
                info!("audio stopped, starting countdown");
                self.persist();
                self.was_playing = false;
            }

            if self.state.power_on {
                let idle = now - self.state.last_active;
                let threshold = self.idle_threshold.as_secs_f64();

                if now - self.last_status_log >= self.status_log_interval.as_secs_f64() {
                    let remaining = (threshold - idle).max(0.0) as u64;
                    info!(
                        "no audio, sleep countdown: {:02}m {:02}s",
                        remaining / 60,
                        remaining % 60
                    );
                    self.last_status_log = now;
                }

                if idle > threshold {
                    info!("idle threshold reached, powering down");
                    if let Err(e) = self.toggle(false, false) {
                        error!(error = %e, "power-down failed, will retry next tick");
                    }
                }
            }
        }
    }

    /// Drive the amplifier to `target`
    ///
    /// Without `force` this is a no-op when the believed state already
    /// matches. The believed state only changes after the actuator reports
    /// success.
    pub fn toggle(&mut self, target: bool, force: bool) -> Result<(), ActuationError> {
        if self.state.power_on == target && !force {
            debug!(target = power_label(target), "already in target state");
            return Ok(());
        }

        self.actuator.actuate()?;

        self.state.power_on = target;
        self.persist();
        info!(target = power_label(target), "amplifier toggled");
        Ok(())
    }

    /// Report believed power, live activity and time left before sleep
    pub fn status(&self, now: f64) -> StatusReport {
        let playing = self.is_playing();
        let time_to_sleep_secs = (self.state.power_on && !playing).then(|| {
            let idle_secs = (now - self.state.last_active).max(0.0) as u64;
            self.idle_threshold.as_secs().saturating_sub(idle_secs)
        });

        StatusReport {
            state_file: self.store.path().display().to_string(),
            power_on: self.state.power_on,
            playing,
            time_to_sleep_secs,
        }
    }

    /// Probe for activity; errors count as silence
    fn is_playing(&self) -> bool {
        match self.probe.probe() {
            Ok(playing) => playing,
            Err(e) => {
                warn!(error = %e, "activity probe failed, treating as idle");
                false
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            error!(error = %e, "could not save state, continuing in memory");
        }
    }
}
