//! Amplifier power actuation
//!
//! The amplifier's power button is wired to a small trigger board on a
//! serial link. Each actuation toggles power; the controller decides when a
//! toggle is needed.

mod serial;

pub use serial::SerialActuator;

/// Toggles amplifier power
pub trait PowerActuator {
    /// Issue one power toggle
    ///
    /// Does not retry on failure.
    fn actuate(&mut self) -> Result<(), ActuationError>;
}

/// Errors driving the actuator link
#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to write trigger: {0}")]
    Io(#[from] std::io::Error),
}
