//! Render state - data structure sent from the session to the UI for rendering

use std::time::Duration;

use crate::messages::ui_events::{ActiveView, Mode};
use crate::mold::ContentType;

/// One row of the request list
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub name: String,
    pub url: String,
    pub method: String,
    pub url_valid: bool,
    pub method_valid: bool,
}

/// Prompt popup contents
#[derive(Debug, Clone, Default)]
pub struct PromptView {
    pub title: String,
    pub input: String,
    pub cursor_position: usize,
    pub error: Option<String>,
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub active: ActiveView,
    pub mode: Mode,

    // List
    pub rows: Vec<ListRow>,
    /// Position of the selection among `rows`
    pub selected: usize,
    pub total: usize,
    pub workspace_label: String,
    pub filter: String,

    // Preview
    pub preview_title: String,
    pub preview_raw: String,
    pub preview_type: Option<ContentType>,
    pub preview_scroll: u16,

    // Prompt
    pub prompt: Option<PromptView>,

    // Stopwatch
    pub running_name: String,
    pub elapsed: Duration,

    // Status bar
    pub status: Option<String>,
}
