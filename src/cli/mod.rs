//! Command-line surface
//!
//! With no flags the binary runs the daemon loop. `--on`/`--off` force a
//! single actuation and `--status` prints a report; both exit right after.

use std::ffi::OsString;
use std::io::Write;

use clap::{ArgGroup, Parser};
use tracing::error;

use crate::actuator::PowerActuator;
use crate::probe::ActivityProbe;
use crate::state::PowerController;

#[derive(Parser, Debug)]
#[command(name = "amp-idle-daemon", version)]
#[command(about = "Powers an amplifier on when audio plays and off after it goes idle", long_about = None)]
#[command(group(ArgGroup::new("mode").args(["on", "off", "status"])))]
pub struct Cli {
    /// Force the amplifier on, regardless of the recorded state
    #[arg(long)]
    pub on: bool,

    /// Force the amplifier off, regardless of the recorded state
    #[arg(long)]
    pub off: bool,

    /// Print recorded power, live audio activity and time left before sleep
    #[arg(short, long)]
    pub status: bool,

    /// Print the status report as JSON
    #[arg(long, requires = "status")]
    pub json: bool,
}

/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the polling loop until interrupted
    Daemon,
    /// Forced override to the given power state
    Force { on: bool },
    /// One-shot status report
    Status { json: bool },
}

impl Cli {
    /// Parse `args`, accepting the older `-on`/`-off` spellings in any case
    pub fn parse_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(args.into_iter().map(|arg| normalize_flag(arg.into())))
    }

    pub fn command(&self) -> Command {
        if self.on {
            Command::Force { on: true }
        } else if self.off {
            Command::Force { on: false }
        } else if self.status {
            Command::Status { json: self.json }
        } else {
            Command::Daemon
        }
    }
}

fn normalize_flag(arg: OsString) -> OsString {
    let Some(flag) = arg.to_str() else {
        return arg;
    };
    match flag.to_ascii_lowercase().as_str() {
        "-on" | "--on" => "--on".into(),
        "-off" | "--off" => "--off".into(),
        "-s" | "--status" => "--status".into(),
        _ => arg,
    }
}

fn label(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

/// Force an actuation toward `on` and report the outcome
pub fn force_power<P, A, W>(
    controller: &mut PowerController<P, A>,
    on: bool,
    out: &mut W,
) -> std::io::Result<()>
where
    P: ActivityProbe,
    A: PowerActuator,
    W: Write,
{
    writeln!(out, "Force turning {}...", label(on))?;
    match controller.toggle(on, true) {
        Ok(()) => writeln!(out, "Amplifier toggled, recorded as {}", label(on)),
        Err(e) => {
            error!(error = %e, "forced actuation failed");
            writeln!(out, "Actuation failed: {e}")
        }
    }
}

/// Write the status report as of `now`
pub fn print_status<P, A, W>(
    controller: &PowerController<P, A>,
    json: bool,
    now: f64,
    out: &mut W,
) -> std::io::Result<()>
where
    P: ActivityProbe,
    A: PowerActuator,
    W: Write,
{
    let report = controller.status(now);
    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)
    } else {
        writeln!(out, "{report}")
    }
}
