//! Amplifier power state
//!
//! - `store`: crash-safe persistence of the believed power state
//! - `machine`: the idle-timeout state machine driving the amplifier

mod machine;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use machine::{now_secs, PowerController};
pub use store::StateStore;
