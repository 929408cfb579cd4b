//! Audio activity detection
//!
//! The controller only needs a yes/no answer to "is anything playing right
//! now". [`AlsaProbe`] answers it from the ALSA proc tree.

mod alsa;

pub use alsa::AlsaProbe;

/// Point-in-time query for audio activity on this host
pub trait ActivityProbe {
    /// Whether audio is currently playing
    ///
    /// Must return well within one poll interval.
    fn probe(&self) -> Result<bool, ProbeError>;
}

/// Errors querying audio activity
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to read audio status: {0}")]
    Io(#[from] std::io::Error),
}
