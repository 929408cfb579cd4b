//! Configuration loading and management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

/// Serial device the trigger board enumerates as
pub const DEVICE_PATH: &str = "/dev/ttyACM0";

/// Serial link speed
pub const BAUD_RATE: u32 = 9600;

/// Continuous silence after which the amplifier is powered down
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(20 * 60);

/// Sleep between two poll ticks
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Gap between the two trigger pulses
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// The board resets when the port is opened; give it time to come up
pub const BOOT_DELAY: Duration = Duration::from_secs(2);

/// Read/write timeout on the serial link
pub const LINK_TIMEOUT: Duration = Duration::from_secs(1);

/// How often the shutdown countdown is logged while idle
pub const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Root of the ALSA proc tree
pub const ALSA_ROOT: &str = "/proc/asound";

const STATE_FILE_NAME: &str = ".amp_state";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Persisted controller state
    pub state_path: PathBuf,

    /// Serial device of the trigger board
    pub device_path: String,
    pub baud_rate: u32,

    pub idle_threshold: Duration,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub boot_delay: Duration,
    pub link_timeout: Duration,
    pub status_log_interval: Duration,

    /// Directory scanned for running PCM substreams
    pub alsa_root: PathBuf,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        Ok(Self::with_home(Path::new(&home)))
    }

    /// Build the configuration with the state file under `home`
    pub fn with_home(home: &Path) -> Self {
        Self {
            state_path: home.join(STATE_FILE_NAME),
            device_path: DEVICE_PATH.to_string(),
            baud_rate: BAUD_RATE,
            idle_threshold: IDLE_THRESHOLD,
            poll_interval: POLL_INTERVAL,
            settle_delay: SETTLE_DELAY,
            boot_delay: BOOT_DELAY,
            link_timeout: LINK_TIMEOUT,
            status_log_interval: STATUS_LOG_INTERVAL,
            alsa_root: PathBuf::from(ALSA_ROOT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_file_under_home() {
        let config = Config::with_home(Path::new("/home/listener"));
        assert_eq!(config.state_path, PathBuf::from("/home/listener/.amp_state"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::with_home(Path::new("/tmp"));
        assert_eq!(config.idle_threshold, Duration::from_secs(1200));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.device_path, "/dev/ttyACM0");
    }
}
