//! Execution layer - outbound HTTP calls for resolved requests
//!
//! The execution actor receives commands and answers each one with exactly
//! one completion message.

pub mod actor;
pub mod client;

pub use actor::ExecutionActor;
