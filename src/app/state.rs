//! Session state - pure data plus the render projection

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::app::post_action::PostAction;
use crate::app::prompt::PromptState;
use crate::messages::render::{ListRow, PromptView};
use crate::messages::ui_events::{ActiveView, Mode};
use crate::messages::RenderState;
use crate::models::{is_valid_url, HttpMethod};
use crate::mold::RequestMold;

/// A list row: cached name/url/method of the mold it wraps
#[derive(Clone, Debug)]
pub struct ListEntry {
    pub name: String,
    pub url: String,
    pub method: String,
    pub mold: RequestMold,
}

impl ListEntry {
    pub fn new(mold: RequestMold) -> Self {
        ListEntry {
            name: mold.name(),
            url: mold.url(),
            method: mold.method(),
            mold,
        }
    }

    /// Case-insensitive match of `query` against "name method url"
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        format!("{} {} {}", self.name, self.method, self.url)
            .to_lowercase()
            .contains(&query)
    }
}

/// An execution in flight
#[derive(Clone, Debug)]
pub struct Stopwatch {
    pub request_id: u64,
    pub entry: usize,
    pub started_at: Instant,
    pub elapsed: Duration,
}

/// Main session state
pub struct SessionState {
    pub active: ActiveView,
    pub mode: Mode,

    // Request list
    pub root: PathBuf,
    pub entries: Vec<ListEntry>,
    /// Index into `entries`; kept on a visible entry when there is one
    pub selected: usize,
    pub filter: String,

    // Preview
    pub preview_entry: Option<usize>,
    pub preview_scroll: u16,

    // Prompt
    pub prompt: Option<PromptState>,

    // Execution
    pub stopwatch: Option<Stopwatch>,
    pub next_request_id: u64,

    // Status bar
    pub status: Option<String>,

    // Termination
    pub finished: bool,
    pub post_action: Option<PostAction>,
}

impl SessionState {
    pub fn new(root: impl Into<PathBuf>, molds: Vec<RequestMold>, mode: Mode) -> Self {
        SessionState {
            active: ActiveView::List,
            mode,
            root: root.into(),
            entries: molds.into_iter().map(ListEntry::new).collect(),
            selected: 0,
            filter: String::new(),
            preview_entry: None,
            preview_scroll: 0,
            prompt: None,
            stopwatch: None,
            next_request_id: 1,
            status: None,
            finished: false,
            post_action: None,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Indices of the entries the filter lets through, in list order
    pub fn visible_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches(&self.filter))
            .map(|(i, _)| i)
            .collect()
    }

    /// The selected entry, if the filter shows it
    pub fn selected_entry(&self) -> Option<&ListEntry> {
        self.entries
            .get(self.selected)
            .filter(|e| e.matches(&self.filter))
    }

    /// Move the selection onto a visible entry: the first at or after the
    /// current position, else the last one
    pub fn clamp_selection(&mut self) {
        let visible = self.visible_indices();
        if visible.contains(&self.selected) {
            return;
        }
        self.selected = visible
            .iter()
            .copied()
            .find(|&i| i >= self.selected)
            .or_else(|| visible.last().copied())
            .unwrap_or(0);
    }

    /// Names currently shown, for uniqueness checks
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Timestamped status line
    pub fn set_status(&mut self, message: impl AsRef<str>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.status = Some(format!("[{}] {}", stamp, message.as_ref()));
    }

    /// End the session. Only the first call has any effect.
    pub fn finish(&mut self, post_action: Option<PostAction>) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.post_action = post_action;
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let preview = self.preview_entry.and_then(|i| self.entries.get(i));
        let running = self
            .stopwatch
            .as_ref()
            .and_then(|s| self.entries.get(s.entry));

        let visible = self.visible_indices();

        RenderState {
            active: self.active,
            mode: self.mode,
            rows: visible
                .iter()
                .map(|&i| {
                    let e = &self.entries[i];
                    ListRow {
                        name: e.name.clone(),
                        url: e.url.clone(),
                        method: e.method.clone(),
                        url_valid: is_valid_url(&e.url),
                        method_valid: HttpMethod::is_valid(&e.method),
                    }
                })
                .collect(),
            selected: visible
                .iter()
                .position(|&i| i == self.selected)
                .unwrap_or(0),
            total: self.entries.len(),
            filter: self.filter.clone(),
            workspace_label: self.root.display().to_string(),
            preview_title: preview.map(|e| e.mold.filename.clone()).unwrap_or_default(),
            preview_raw: preview.map(|e| e.mold.raw().to_string()).unwrap_or_default(),
            preview_type: preview.map(|e| e.mold.content_type),
            preview_scroll: self.preview_scroll,
            prompt: self.prompt.as_ref().map(|p| PromptView {
                title: p.context.op.title().to_string(),
                input: p.input.clone(),
                cursor_position: p.cursor_position,
                error: p.error.as_ref().map(|e| e.to_string()),
            }),
            running_name: running.map(|e| e.name.clone()).unwrap_or_default(),
            elapsed: self.stopwatch.as_ref().map(|s| s.elapsed).unwrap_or_default(),
            status: self.status.clone(),
        }
    }
}
