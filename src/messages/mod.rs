//! Message types for inter-layer communication in the actor-based architecture.
//!
//! This module defines all messages that flow between the UI, the session
//! controller and the execution adapter.

pub mod ui_events;
pub mod network;
pub mod render;

pub use ui_events::SessionEvent;
pub use network::{ExecutionCommand, ExecutionResult};
pub use render::RenderState;
