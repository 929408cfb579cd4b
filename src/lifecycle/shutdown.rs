//! SIGINT/SIGTERM handling for the daemon loop
//!
//! State is persisted after every transition, so stopping needs no cleanup;
//! the loop is simply dropped once a signal arrives.

use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, error};

/// Resolves when the daemon is asked to stop
pub struct ShutdownSignal {
    sigterm: Option<Signal>,
    sigint: Option<Signal>,
}

impl ShutdownSignal {
    /// Install the SIGTERM and SIGINT listeners
    ///
    /// Must be called inside the runtime. A listener that cannot be
    /// installed is logged and never fires; the daemon keeps polling.
    pub fn install() -> Self {
        Self {
            sigterm: listen(SignalKind::terminate(), "SIGTERM"),
            sigint: listen(SignalKind::interrupt(), "SIGINT"),
        }
    }

    pub async fn wait(&mut self) {
        tokio::select! {
            _ = next(&mut self.sigterm) => debug!("received SIGTERM"),
            _ = next(&mut self.sigint) => debug!("received SIGINT"),
        }
    }
}

fn listen(kind: SignalKind, name: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(listener) => Some(listener),
        Err(e) => {
            error!(signal = name, error = %e, "cannot listen for signal");
            None
        }
    }
}

/// Next delivery of `listener`; pends forever without one
async fn next(listener: &mut Option<Signal>) {
    if let Some(listener) = listener {
        if listener.recv().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_without_listeners_never_fires() {
        let mut shutdown = ShutdownSignal {
            sigterm: None,
            sigint: None,
        };
        tokio_test::block_on(async {
            let waited = tokio::time::timeout(Duration::from_millis(20), shutdown.wait()).await;
            assert!(waited.is_err());
        });
    }

    #[test]
    fn test_installed_listeners_wait_for_a_signal() {
        tokio_test::block_on(async {
            let mut shutdown = ShutdownSignal::install();
            assert!(shutdown.sigterm.is_some());
            assert!(shutdown.sigint.is_some());

            let waited = tokio::time::timeout(Duration::from_millis(20), shutdown.wait()).await;
            assert!(waited.is_err());
        });
    }
}
