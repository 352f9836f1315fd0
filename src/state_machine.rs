//! Chat turn state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions: the
//! runtime feeds [`Event`]s in and executes the returned [`Effect`]s.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{EndReason, Event};
pub use state::{ChatState, Phase};
pub use transition::{transition, TransitionError, TransitionResult, FAILURE_NOTICE};
