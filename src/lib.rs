//! # goful
//!
//! A terminal manager for API request definitions ("molds") kept as files in
//! a workspace directory.
//!
//! ## Features
//! - Declarative requests (`.yaml`/`.yml`) with typed fields
//! - Scripted requests (`.star`) with metadata in tagged comment lines
//! - Browse, preview, run, rename, copy and delete from one list
//! - Create and edit requests in an external editor
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - Session Layer (state machine returning one post-action)
//! - Execution Layer (Tokio runtime)

pub mod constants;
pub mod error;
pub mod config;
pub mod models;
pub mod mold;
pub mod storage;
pub mod editor;
pub mod ui;
pub mod messages;
pub mod app;
pub mod network;

// Re-export commonly used types
pub use models::{ExecutionReport, HttpMethod, ResolvedRequest};
pub use mold::{ContentType, RequestMold};
pub use error::{MoldError, ValidationError};
pub use messages::{SessionEvent, ExecutionCommand, ExecutionResult, RenderState};
pub use app::{PostAction, PostActionKind, SessionActor, SessionState};
pub use network::ExecutionActor;
