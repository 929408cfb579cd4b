//! Fake collaborators shared by the controller and CLI tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::store::ControllerState;
use super::{PowerController, StateStore};
use crate::actuator::{ActuationError, PowerActuator};
use crate::config::Config;
use crate::probe::{ActivityProbe, ProbeError};

pub const T0: f64 = 1_700_000_000.0;

/// Probe returning a settable reading, or an error
#[derive(Clone, Default)]
pub struct FakeProbe {
    pub playing: Rc<Cell<bool>>,
    pub broken: Rc<Cell<bool>>,
}

impl ActivityProbe for FakeProbe {
    fn probe(&self) -> Result<bool, ProbeError> {
        if self.broken.get() {
            return Err(std::io::Error::other("no sound card").into());
        }
        Ok(self.playing.get())
    }
}

/// Actuator counting calls; queued results are consumed first
#[derive(Clone, Default)]
pub struct FakeActuator {
    pub calls: Rc<Cell<usize>>,
    failures: Rc<RefCell<VecDeque<bool>>>,
}

impl FakeActuator {
    pub fn fail_next(&self) {
        self.failures.borrow_mut().push_back(true);
    }
}

impl PowerActuator for FakeActuator {
    fn actuate(&mut self) -> Result<(), ActuationError> {
        self.calls.set(self.calls.get() + 1);
        if self.failures.borrow_mut().pop_front().unwrap_or(false) {
            return Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "link timeout").into());
        }
        Ok(())
    }
}

pub struct Harness {
    pub controller: PowerController<FakeProbe, FakeActuator>,
    pub probe: FakeProbe,
    pub actuator: FakeActuator,
    pub store: StateStore,
    _dir: tempfile::TempDir,
}

/// Controller over fakes with its state file in a fresh temp dir
pub fn harness(initial: Option<ControllerState>, now: f64) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_home(dir.path());
    let store = StateStore::new(&config.state_path);
    if let Some(state) = initial {
        store.save(&state).unwrap();
    }

    let probe = FakeProbe::default();
    let actuator = FakeActuator::default();
    let controller =
        PowerController::new(&config, store.clone(), probe.clone(), actuator.clone(), now);

    Harness {
        controller,
        probe,
        actuator,
        store,
        _dir: dir,
    }
}

pub fn on_since(last_active: f64) -> Option<ControllerState> {
    Some(ControllerState {
        power_on: true,
        last_active,
    })
}
