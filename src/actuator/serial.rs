//! Double-pulse trigger over a serial link
//!
//! The trigger board is edge-triggered and resets when the port is opened,
//! so one actuation is: open, wait for boot, send `1`, settle, send `1`
//! again, then read the board's one-line acknowledgment if it sends one.

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use super::{ActuationError, PowerActuator};
use crate::config::Config;

const TRIGGER: &[u8] = b"1";

/// Actuator driving the trigger board over `serialport`
#[derive(Debug, Clone)]
pub struct SerialActuator {
    device: String,
    baud_rate: u32,
    timeout: Duration,
    boot_delay: Duration,
    settle_delay: Duration,
}

impl SerialActuator {
    pub fn new(config: &Config) -> Self {
        Self {
            device: config.device_path.clone(),
            baud_rate: config.baud_rate,
            timeout: config.link_timeout,
            boot_delay: config.boot_delay,
            settle_delay: config.settle_delay,
        }
    }
}

impl PowerActuator for SerialActuator {
    fn actuate(&mut self) -> Result<(), ActuationError> {
        let port = serialport::new(&self.device, self.baud_rate)
            .timeout(self.timeout)
            .open()
            .map_err(|source| ActuationError::Open {
                device: self.device.clone(),
                source,
            })?;

        thread::sleep(self.boot_delay);

        debug!(device = %self.device, "sending double-pulse power command");
        match double_pulse(port, self.settle_delay)? {
            Some(ack) => info!(%ack, "trigger board acknowledged"),
            None => debug!("no acknowledgment from trigger board"),
        }
        Ok(())
    }
}

/// Send the two trigger pulses and read an optional acknowledgment line
///
/// Only write failures are errors. Once both pulses are out the board has
/// toggled, so anything wrong with the reply is reported as no reply.
fn double_pulse<L: Read + Write>(mut link: L, settle: Duration) -> std::io::Result<Option<String>> {
    link.write_all(TRIGGER)?;
    link.flush()?;
    thread::sleep(settle);
    link.write_all(TRIGGER)?;
    link.flush()?;

    let mut line = Vec::new();
    if let Err(e) = BufReader::new(link).read_until(b'\n', &mut line) {
        if !matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) {
            debug!(error = %e, "unreadable acknowledgment");
        }
        return Ok(None);
    }

    let ack = String::from_utf8_lossy(&line);
    let ack = ack.trim();
    Ok((!ack.is_empty()).then(|| ack.to_string()))
}
