//! Conversation router state machine
//!
//! Pure state transitions in the Elm style: `transition` maps a state and an
//! event to a new state plus a list of effects, and never performs I/O. The
//! runtime executes the effects and feeds the resulting events back in.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{RouterContext, RouterState, ToolCall, ToolResult};
pub use transition::{transition, TransitionError, TransitionResult};
