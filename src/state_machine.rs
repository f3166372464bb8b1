//! Lead qualification state machine
//!
//! Elm-style: a pure `transition` turns (state, event) into a new state plus
//! effects, and the runtime performs the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Response};
pub use event::Event;
pub use state::{LeadState, QualificationContext};
pub use transition::{transition, TransitionError, TransitionResult};
