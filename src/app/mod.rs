//! Session layer - the interactive state machine
//!
//! The session actor receives UI events, execution results and timer ticks,
//! updates state, emits execution commands and render state, and returns a
//! single post-action when the session ends.

pub mod state;
pub mod actor;
pub mod commands;
pub mod prompt;
pub mod post_action;

pub use state::{ListEntry, SessionState};
pub use actor::SessionActor;
pub use post_action::{PostAction, PostActionKind};
pub use prompt::{PromptContext, PromptOp};
