//! ALSA substream status probe
//!
//! Every open PCM substream exposes `/proc/asound/cardN/pcmMp/subK/status`;
//! a stream that is actually moving samples reports `state: RUNNING`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::{ActivityProbe, ProbeError};

const RUNNING_MARKER: &str = "RUNNING";

/// Probe reporting activity when any ALSA substream is running
#[derive(Debug, Clone)]
pub struct AlsaProbe {
    root: PathBuf,
}

impl AlsaProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn any_substream_running(&self) -> Result<bool, ProbeError> {
        for card in prefixed_dirs(&self.root, "card")? {
            // Cards can disappear between listing and reading (USB unplug)
            let Ok(pcms) = prefixed_dirs(&card, "pcm") else {
                continue;
            };
            for pcm in pcms {
                let Ok(subs) = prefixed_dirs(&pcm, "sub") else {
                    continue;
                };
                for sub in subs {
                    let Ok(status) = fs::read_to_string(sub.join("status")) else {
                        continue;
                    };
                    if status.contains(RUNNING_MARKER) {
                        trace!(substream = ?sub, "substream running");
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}

impl ActivityProbe for AlsaProbe {
    fn probe(&self) -> Result<bool, ProbeError> {
        self.any_substream_running()
    }
}

/// Subdirectories of `dir` whose name starts with `prefix`
fn prefixed_dirs(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, ProbeError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_match = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(prefix));
        if is_match && entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}
