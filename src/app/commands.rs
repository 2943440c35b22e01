//! Command handlers - business logic for processing session events

use std::time::Instant;

use crate::app::post_action::{PostAction, PostActionKind};
use crate::app::prompt::{validate_name, PromptContext, PromptOp, PromptState};
use crate::app::state::{ListEntry, SessionState, Stopwatch};
use crate::constants::COPY_SUFFIX;
use crate::messages::ui_events::{ActiveView, Mode};
use crate::messages::{ExecutionCommand, ExecutionResult};
use crate::storage;

impl SessionState {
    // ========================
    // Navigation
    // ========================

    // Navigation walks the filtered list and wraps at both ends

    pub fn select_next(&mut self) {
        let visible = self.visible_indices();
        if visible.is_empty() {
            return;
        }
        self.selected = match visible.iter().position(|&i| i == self.selected) {
            Some(pos) => visible[(pos + 1) % visible.len()],
            None => visible[0],
        };
    }

    pub fn select_prev(&mut self) {
        let visible = self.visible_indices();
        if visible.is_empty() {
            return;
        }
        self.selected = match visible.iter().position(|&i| i == self.selected) {
            Some(pos) => visible[pos.checked_sub(1).unwrap_or(visible.len() - 1)],
            None => visible[visible.len() - 1],
        };
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.visible_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.visible_indices().last() {
            self.selected = last;
        }
    }

    // ========================
    // Filter
    // ========================

    pub fn start_filter(&mut self) {
        if self.active == ActiveView::List {
            self.active = ActiveView::Filter;
        }
    }

    pub fn filter_char(&mut self, c: char) {
        if self.active == ActiveView::Filter {
            self.filter.push(c);
            self.clamp_selection();
        }
    }

    pub fn filter_backspace(&mut self) {
        if self.active == ActiveView::Filter {
            self.filter.pop();
            self.clamp_selection();
        }
    }

    /// Enter: keep the filter and go back to the narrowed list
    pub fn apply_filter(&mut self) {
        if self.active != ActiveView::Filter {
            return;
        }
        if self.filter.trim().is_empty() {
            self.filter.clear();
        }
        self.active = ActiveView::List;
        self.clamp_selection();
    }

    fn clear_filter(&mut self) {
        self.filter.clear();
        self.clamp_selection();
    }

    // ========================
    // Mode and back-out
    // ========================

    pub fn enter_edit_mode(&mut self) {
        if self.active == ActiveView::List && self.mode == Mode::Select {
            self.mode = Mode::Edit;
        }
    }

    /// Esc / q: leave the current view, drop an applied filter, or end the
    /// session from the list
    pub fn cancel(&mut self) {
        match self.active {
            ActiveView::Filter => {
                self.active = ActiveView::List;
                self.clear_filter();
            }
            ActiveView::List if !self.filter.is_empty() => self.clear_filter(),
            ActiveView::Preview => {
                self.active = ActiveView::List;
                self.preview_entry = None;
                self.preview_scroll = 0;
            }
            ActiveView::Prompt => {
                self.active = ActiveView::List;
                self.prompt = None;
            }
            ActiveView::List => match self.mode {
                Mode::Edit => self.mode = Mode::Select,
                Mode::Select => self.finish(None),
            },
            _ => {}
        }
    }

    pub fn quit(&mut self) {
        self.finish(None);
    }

    // ========================
    // Preview
    // ========================

    pub fn preview_selected(&mut self) {
        if self.active == ActiveView::List && self.selected_entry().is_some() {
            self.active = ActiveView::Preview;
            self.preview_entry = Some(self.selected);
            self.preview_scroll = 0;
        }
    }

    pub fn scroll_up(&mut self) {
        self.preview_scroll = self.preview_scroll.saturating_sub(1);
    }

    /// Scroll down, stopping with the last line at the top
    pub fn scroll_down(&mut self) {
        let last_line = self
            .preview_entry
            .and_then(|i| self.entries.get(i))
            .map(|e| e.mold.raw().lines().count().saturating_sub(1))
            .unwrap_or(0);
        let max = u16::try_from(last_line).unwrap_or(u16::MAX);
        if self.preview_scroll < max {
            self.preview_scroll += 1;
        }
    }

    // ========================
    // Hand-off to the caller
    // ========================

    /// End the session so the caller can open the selected file in an editor
    pub fn edit_selected(&mut self) {
        if self.active != ActiveView::List {
            return;
        }
        if let Some(entry) = self.selected_entry() {
            let mold = entry.mold.clone();
            let path = mold.path().display().to_string();
            self.active = ActiveView::Update;
            self.finish(Some(PostAction::new(PostActionKind::EditRequest, path, Some(mold))));
        }
    }

    // ========================
    // Prompt
    // ========================

    /// Open the name prompt for a mutating operation (edit mode only)
    pub fn open_prompt(&mut self, op: PromptOp) {
        if self.active != ActiveView::List || self.mode != Mode::Edit {
            return;
        }

        let context = match op {
            PromptOp::CreateSimple | PromptOp::CreateComplex => PromptContext {
                op,
                initial: String::new(),
                target: None,
            },
            PromptOp::Rename | PromptOp::Copy => {
                let Some(entry) = self.selected_entry() else {
                    return;
                };
                let initial = if op == PromptOp::Copy {
                    format!("{}{}", entry.name, COPY_SUFFIX)
                } else {
                    entry.name.clone()
                };
                PromptContext {
                    op,
                    initial,
                    target: Some(self.selected),
                }
            }
        };

        self.prompt = Some(PromptState::new(context));
        self.active = ActiveView::Prompt;
        self.revalidate_prompt();
    }

    pub fn prompt_char(&mut self, c: char) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.enter_char(c);
        }
        self.revalidate_prompt();
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.delete_char();
        }
        self.revalidate_prompt();
    }

    pub fn prompt_cursor_left(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.move_cursor_left();
        }
    }

    pub fn prompt_cursor_right(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.move_cursor_right();
        }
    }

    /// Run the name validator against the current input
    fn revalidate_prompt(&mut self) {
        let Some(prompt) = self.prompt.as_ref() else {
            return;
        };
        let error = validate_name(&prompt.input, self.names(), self.prompt_current_name())
            .err();
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.error = error;
        }
    }

    /// Name of the request a rename targets; it may keep its own name
    fn prompt_current_name(&self) -> Option<&str> {
        let prompt = self.prompt.as_ref()?;
        if prompt.context.op != PromptOp::Rename {
            return None;
        }
        let index = prompt.context.target?;
        self.entries.get(index).map(|e| e.name.as_str())
    }

    /// Enter in the prompt. Invalid input keeps the prompt open.
    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.as_ref() else {
            return;
        };
        let name = match validate_name(&prompt.input, self.names(), self.prompt_current_name()) {
            Ok(name) => name,
            Err(e) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.error = Some(e);
                }
                return;
            }
        };

        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let context = prompt.context;

        match (context.op, context.target) {
            (PromptOp::Rename, Some(index)) => {
                self.active = ActiveView::List;
                self.apply_rename(index, &name);
            }
            (PromptOp::Copy, Some(index)) => {
                self.active = ActiveView::List;
                self.apply_copy(index, &name);
            }
            (PromptOp::CreateSimple, _) => {
                self.active = ActiveView::Create;
                self.finish(Some(PostAction::new(PostActionKind::CreateSimpleRequest, name, None)));
            }
            (PromptOp::CreateComplex, _) => {
                self.active = ActiveView::CreateComplex;
                self.finish(Some(PostAction::new(PostActionKind::CreateComplexRequest, name, None)));
            }
            (PromptOp::Rename | PromptOp::Copy, None) => {
                self.active = ActiveView::List;
            }
        }
    }

    // ========================
    // In-session mutations
    // ========================

    /// Rename the entry at `index` on disk and in the list, keeping its position
    pub fn apply_rename(&mut self, index: usize, new_name: &str) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        let old_name = entry.name.clone();
        let previous = entry.mold.clone();

        let mut renamed = previous.clone();
        let result = renamed
            .rename(new_name)
            .and_then(|_| storage::persist_rename(&previous, &renamed));

        match result {
            Ok(()) => {
                self.entries[index] = ListEntry::new(renamed);
                self.clamp_selection();
                tracing::info!(from = %old_name, to = %new_name, "Renamed request");
                self.set_status(format!("Renamed '{}' to '{}'", old_name, new_name));
                true
            }
            Err(e) => {
                tracing::error!(name = %old_name, error = %e, "Rename failed");
                self.set_status(format!("Rename of '{}' failed: {}", old_name, e));
                false
            }
        }
    }

    /// Duplicate the entry at `index` under `new_name`, right after the source
    pub fn apply_copy(&mut self, index: usize, new_name: &str) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        let source_name = entry.name.clone();

        let mut copy = entry.mold.clone();
        let result = copy
            .rename(new_name)
            .and_then(|_| storage::persist_new(&copy));

        match result {
            Ok(()) => {
                self.entries.insert(index + 1, ListEntry::new(copy));
                self.selected = index + 1;
                self.clamp_selection();
                tracing::info!(from = %source_name, to = %new_name, "Copied request");
                self.set_status(format!("Copied '{}' to '{}'", source_name, new_name));
                true
            }
            Err(e) => {
                tracing::error!(name = %source_name, error = %e, "Copy failed");
                self.set_status(format!("Copy of '{}' failed: {}", source_name, e));
                false
            }
        }
    }

    /// Delete the selected request's file, then drop it from the list
    pub fn delete_selected(&mut self) -> bool {
        if self.active != ActiveView::List || self.mode != Mode::Edit {
            return false;
        }
        let Some(entry) = self.selected_entry() else {
            return false;
        };
        let name = entry.name.clone();

        match entry.mold.delete_from_fs() {
            Ok(()) => {
                self.entries.remove(self.selected);
                self.clamp_selection();
                self.set_status(format!("Deleted '{}'", name));
                true
            }
            Err(e) => {
                self.set_status(format!("Delete of '{}' failed: {}", name, e));
                false
            }
        }
    }

    // ========================
    // Execution
    // ========================

    /// Start executing the selected request
    pub fn run_selected(&mut self) -> Option<ExecutionCommand> {
        if self.active != ActiveView::List {
            return None;
        }
        let request = self.selected_entry()?.mold.resolve();
        let entry = self.selected;
        let id = self.next_id();

        self.active = ActiveView::Stopwatch;
        self.stopwatch = Some(Stopwatch {
            request_id: id,
            entry,
            started_at: Instant::now(),
            elapsed: Default::default(),
        });

        Some(ExecutionCommand::Execute { id, request })
    }

    /// Timer tick while a request is in flight
    pub fn tick(&mut self) {
        if let Some(stopwatch) = self.stopwatch.as_mut() {
            stopwatch.elapsed = stopwatch.started_at.elapsed();
        }
    }

    /// Completion signal from the execution adapter
    pub fn handle_result(&mut self, result: ExecutionResult) {
        let Some(stopwatch) = self.stopwatch.as_ref() else {
            return;
        };
        if self.active != ActiveView::Stopwatch || stopwatch.request_id != result.id() {
            tracing::debug!(id = result.id(), "Ignoring stale execution result");
            return;
        }

        let mold = self.entries.get(stopwatch.entry).map(|e| e.mold.clone());
        let report = result.into_report();
        self.tick();
        self.finish(Some(PostAction::new(
            PostActionKind::PrintRequest,
            report.to_text(),
            mold,
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::load_workspace;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn workspace() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("get-user.yaml"),
            "name: get-user\nurl: http://x/users/1\nmethod: GET\n",
        )
        .unwrap();
        fs::write(dir.path().join("ping.star"), "# meta:name: ping\n# doc:url: http://x/ping\n").unwrap();
        dir
    }

    fn session(dir: &TempDir, mode: Mode) -> SessionState {
        let molds = load_workspace(dir.path()).unwrap();
        SessionState::new(dir.path(), molds, mode)
    }

    fn type_text(state: &mut SessionState, text: &str) {
        for c in text.chars() {
            state.prompt_char(c);
        }
    }

    fn type_filter(state: &mut SessionState, text: &str) {
        for c in text.chars() {
            state.filter_char(c);
        }
    }

    fn clear_prompt(state: &mut SessionState) {
        while state.prompt.as_ref().map(|p| !p.input.is_empty()).unwrap_or(false) {
            state.prompt_backspace();
        }
    }

    #[test]
    fn test_mode_toggle_and_cancel() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Select);

        state.enter_edit_mode();
        assert_eq!(state.mode, Mode::Edit);
        assert_eq!(state.active, ActiveView::List);

        state.cancel();
        assert_eq!(state.mode, Mode::Select);
        assert!(!state.finished);

        state.cancel();
        assert!(state.finished);
        assert!(state.post_action.is_none());
    }

    #[test]
    fn test_mutations_locked_in_select_mode() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Select);

        state.open_prompt(PromptOp::Rename);
        assert_eq!(state.active, ActiveView::List);
        assert!(!state.delete_selected());
        assert!(dir.path().join("get-user.yaml").exists());
    }

    #[test]
    fn test_rename_in_place() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Edit);

        state.open_prompt(PromptOp::Rename);
        assert_eq!(state.prompt.as_ref().unwrap().input, "get-user");
        // Own name is not a collision
        assert!(state.prompt.as_ref().unwrap().error.is_none());

        type_text(&mut state, "-v2");
        state.submit_prompt();

        assert_eq!(state.active, ActiveView::List);
        assert_eq!(state.entries.len(), 2);
        assert_eq!(state.entries[0].name, "get-user-v2");
        assert_eq!(state.entries[0].mold.filename, "get-user-v2.yaml");
        assert!(state.status.as_ref().unwrap().contains("Renamed"));
        assert!(!dir.path().join("get-user.yaml").exists());
        assert!(fs::read_to_string(dir.path().join("get-user-v2.yaml"))
            .unwrap()
            .contains("name: get-user-v2"));
    }

    #[test]
    fn test_rename_to_duplicate_is_rejected_inline() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Edit);

        state.open_prompt(PromptOp::Rename);
        clear_prompt(&mut state);
        assert!(state.prompt.as_ref().unwrap().error.is_some());

        type_text(&mut state, "ping");
        state.submit_prompt();

        assert_eq!(state.active, ActiveView::Prompt);
        assert!(state.prompt.as_ref().unwrap().error.is_some());
        assert_eq!(state.entries[0].name, "get-user");
        assert!(dir.path().join("get-user.yaml").exists());
    }

    #[test]
    fn test_failed_rename_leaves_state_unchanged() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Edit);
        fs::remove_file(dir.path().join("ping.star")).unwrap();
        fs::write(dir.path().join("ping.star"), "url = 1\n").unwrap();
        state.entries[1] = ListEntry::new(
            crate::mold::RequestMold::from_source(dir.path(), "ping.star", "url = 1\n").unwrap(),
        );

        assert!(!state.apply_rename(1, "pong"));
        assert_eq!(state.entries[1].mold.filename, "ping.star");
        assert!(state.status.as_ref().unwrap().contains("failed"));
    }

    #[test]
    fn test_copy_inserts_after_source() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Edit);

        state.open_prompt(PromptOp::Copy);
        assert_eq!(state.prompt.as_ref().unwrap().input, "get-user-copy");
        state.submit_prompt();

        let names: Vec<&str> = state.names().collect();
        assert_eq!(names, vec!["get-user", "get-user-copy", "ping"]);
        assert_eq!(state.selected, 1);
        assert!(dir.path().join("get-user.yaml").exists());
        assert!(dir.path().join("get-user-copy.yaml").exists());
        assert_eq!(state.entries[1].url, "http://x/users/1");
    }

    #[test]
    fn test_copy_onto_existing_file_fails_cleanly() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Edit);
        let squatter = dir.path().join("get-user-copy.yaml");
        fs::write(&squatter, "# not a request yet\n").unwrap();

        state.open_prompt(PromptOp::Copy);
        state.submit_prompt();

        assert_eq!(state.active, ActiveView::List);
        let names: Vec<&str> = state.names().collect();
        assert_eq!(names, vec!["get-user", "ping"]);
        assert_eq!(state.selected, 0);
        assert!(state.status.as_ref().unwrap().contains("failed"));
        assert_eq!(fs::read_to_string(&squatter).unwrap(), "# not a request yet\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("get-user.yaml")).unwrap(),
            "name: get-user\nurl: http://x/users/1\nmethod: GET\n"
        );
    }

    #[test]
    fn test_filter_narrows_list_and_navigation() {
        let dir = workspace();
        fs::write(
            dir.path().join("list-users.yaml"),
            "name: list-users\nurl: http://x/users\nmethod: GET\n",
        )
        .unwrap();
        let mut state = session(&dir, Mode::Select);
        state.select_last();
        assert_eq!(state.selected_entry().unwrap().name, "ping");

        state.start_filter();
        assert_eq!(state.active, ActiveView::Filter);
        type_filter(&mut state, "USERS");

        // Matches on url too, and the hidden selection moves onto a match
        let render = state.to_render_state();
        let shown: Vec<&str> = render.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(shown, vec!["get-user", "list-users"]);
        assert_eq!(render.total, 3);
        assert_eq!(state.selected_entry().unwrap().name, "list-users");
        assert_eq!(render.selected, 1);

        state.apply_filter();
        assert_eq!(state.active, ActiveView::List);
        state.select_next();
        assert_eq!(state.selected_entry().unwrap().name, "get-user");
        state.select_prev();
        assert_eq!(state.selected_entry().unwrap().name, "list-users");

        // Esc drops the filter before it backs out of the list
        state.cancel();
        assert!(!state.finished);
        assert!(state.filter.is_empty());
        assert_eq!(state.to_render_state().rows.len(), 3);
    }

    #[test]
    fn test_filter_with_no_match_blocks_actions() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Edit);

        state.start_filter();
        type_filter(&mut state, "zzz");
        state.apply_filter();

        assert!(state.to_render_state().rows.is_empty());
        assert!(state.selected_entry().is_none());
        assert!(state.run_selected().is_none());
        assert!(!state.delete_selected());
        assert!(dir.path().join("get-user.yaml").exists());

        state.start_filter();
        state.cancel();
        assert_eq!(state.active, ActiveView::List);
        assert_eq!(state.selected_entry().unwrap().name, "get-user");
    }

    #[test]
    fn test_render_flags_invalid_url_and_method() {
        let dir = workspace();
        fs::write(
            dir.path().join("draft.yaml"),
            "name: draft\nurl: <your url>\nmethod: <http method>\n",
        )
        .unwrap();
        let state = session(&dir, Mode::Select);
        let render = state.to_render_state();

        let draft = render.rows.iter().find(|r| r.name == "draft").unwrap();
        assert!(!draft.url_valid);
        assert!(!draft.method_valid);
        let user = render.rows.iter().find(|r| r.name == "get-user").unwrap();
        assert!(user.url_valid);
        assert!(user.method_valid);
    }

    #[test]
    fn test_preview_scroll_stops_at_last_line() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Select);
        state.preview_selected();

        for _ in 0..10 {
            state.scroll_down();
        }
        // get-user.yaml has three lines
        assert_eq!(state.preview_scroll, 2);

        state.scroll_up();
        assert_eq!(state.preview_scroll, 1);
    }

    #[test]
    fn test_create_prompt_ends_session() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Edit);

        state.open_prompt(PromptOp::CreateComplex);
        state.submit_prompt();
        assert_eq!(state.active, ActiveView::Prompt);

        type_text(&mut state, " new-script ");
        state.submit_prompt();

        assert!(state.finished);
        assert_eq!(state.active, ActiveView::CreateComplex);
        let action = state.post_action.as_ref().unwrap();
        assert_eq!(action.kind, PostActionKind::CreateComplexRequest);
        assert_eq!(action.payload, "new-script");
        assert!(action.context.is_none());
    }

    #[test]
    fn test_delete_selected() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Edit);
        state.select_last();

        assert!(state.delete_selected());
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.selected, 0);
        assert!(!dir.path().join("ping.star").exists());

        // File vanished behind our back: entry stays
        fs::remove_file(dir.path().join("get-user.yaml")).unwrap();
        assert!(!state.delete_selected());
        assert_eq!(state.entries.len(), 1);
    }

    #[test]
    fn test_preview_and_back() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Select);
        state.select_next();
        state.preview_selected();

        assert_eq!(state.active, ActiveView::Preview);
        let render = state.to_render_state();
        assert_eq!(render.preview_title, "ping.star");
        assert!(render.preview_raw.contains("meta:name: ping"));

        state.cancel();
        assert_eq!(state.active, ActiveView::List);
        assert!(!state.finished);
    }

    #[test]
    fn test_edit_selected_hands_back_path() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Select);
        state.edit_selected();

        assert_eq!(state.active, ActiveView::Update);
        let action = state.post_action.as_ref().unwrap();
        assert_eq!(action.kind, PostActionKind::EditRequest);
        assert!(action.payload.ends_with("get-user.yaml"));
        assert_eq!(action.context.as_ref().unwrap().name(), "get-user");
    }

    #[test]
    fn test_run_and_complete() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Select);

        let command = state.run_selected().unwrap();
        let id = match command {
            ExecutionCommand::Execute { id, request } => {
                assert_eq!(request.url, "http://x/users/1");
                id
            }
            other => panic!("unexpected command {:?}", other),
        };
        assert_eq!(state.active, ActiveView::Stopwatch);
        assert!(state.run_selected().is_none());

        // Stale ids are ignored
        state.handle_result(ExecutionResult::Failed {
            id: id + 100,
            message: "nope".to_string(),
            time_ms: 1,
        });
        assert!(!state.finished);

        state.handle_result(ExecutionResult::Completed {
            id,
            status: 200,
            headers: vec![],
            body: "{}".to_string(),
            time_ms: 5,
        });
        assert!(state.finished);
        let action = state.post_action.as_ref().unwrap();
        assert_eq!(action.kind, PostActionKind::PrintRequest);
        assert!(action.payload.starts_with("HTTP 200 (5 ms)"));
    }

    #[test]
    fn test_finish_only_once() {
        let dir = workspace();
        let mut state = session(&dir, Mode::Select);
        state.edit_selected();
        state.quit();
        assert_eq!(state.post_action.as_ref().unwrap().kind, PostActionKind::EditRequest);
    }
}
