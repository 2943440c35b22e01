//! Session actor - message loop processing UI events, timer ticks and
//! execution results

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::app::post_action::PostAction;
use crate::app::prompt::PromptOp;
use crate::app::state::SessionState;
use crate::messages::ui_events::{key_to_session_event, ActiveView};
use crate::messages::{ExecutionCommand, ExecutionResult, RenderState, SessionEvent};

/// Stopwatch refresh rate
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Session actor that owns the state machine
pub struct SessionActor {
    state: SessionState,
    exec_tx: mpsc::UnboundedSender<ExecutionCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl SessionActor {
    pub fn new(
        state: SessionState,
        exec_tx: mpsc::UnboundedSender<ExecutionCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        SessionActor {
            state,
            exec_tx,
            render_tx,
        }
    }

    /// Run the actor message loop until the session ends.
    ///
    /// Dropping the render sender on return tells the UI loop to stop.
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<SessionEvent>,
        mut exec_rx: mpsc::UnboundedReceiver<ExecutionResult>,
    ) -> Option<PostAction> {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            let in_flight = self.state.active == ActiveView::Stopwatch;

            tokio::select! {
                event = ui_rx.recv() => {
                    match event {
                        Some(event) => self.handle_ui_event(event),
                        // UI is gone; nothing left to drive the session
                        None => self.state.quit(),
                    }
                }
                Some(result) = exec_rx.recv() => {
                    self.state.handle_result(result);
                }
                _ = ticker.tick(), if in_flight => {
                    self.state.tick();
                }
            }

            if self.state.finished {
                break;
            }
            let _ = self.render_tx.send(self.state.to_render_state());
        }

        let _ = self.exec_tx.send(ExecutionCommand::Shutdown);
        tracing::info!(
            post_action = ?self.state.post_action.as_ref().map(|a| a.kind),
            "Session ended"
        );
        self.state.post_action.take()
    }

    /// Route one UI event to the state machine
    fn handle_ui_event(&mut self, event: SessionEvent) {
        // Keys are mapped here so each one sees the view left by the one before
        if let SessionEvent::Key(key) = event {
            if let Some(mapped) = key_to_session_event(key, self.state.active, self.state.mode) {
                self.handle_ui_event(mapped);
            }
            return;
        }

        if event == SessionEvent::Quit {
            self.state.quit();
            return;
        }

        // While executing only the timer is live
        if self.state.active == ActiveView::Stopwatch {
            tracing::debug!(?event, "Ignoring input while request is running");
            return;
        }

        match event {
            // List navigation
            SessionEvent::SelectNext => self.state.select_next(),
            SessionEvent::SelectPrev => self.state.select_prev(),
            SessionEvent::SelectFirst => self.state.select_first(),
            SessionEvent::SelectLast => self.state.select_last(),

            // Mode
            SessionEvent::EnterEditMode => self.state.enter_edit_mode(),
            SessionEvent::Cancel => self.state.cancel(),

            // Request actions
            SessionEvent::RunSelected => {
                if let Some(cmd) = self.state.run_selected() {
                    let _ = self.exec_tx.send(cmd);
                }
            }
            SessionEvent::EditSelected => self.state.edit_selected(),
            SessionEvent::PreviewSelected => self.state.preview_selected(),

            // Filter
            SessionEvent::StartFilter => self.state.start_filter(),
            SessionEvent::FilterChar(c) => self.state.filter_char(c),
            SessionEvent::FilterBackspace => self.state.filter_backspace(),
            SessionEvent::ApplyFilter => self.state.apply_filter(),

            // Mutations
            SessionEvent::CreateSimple => self.state.open_prompt(PromptOp::CreateSimple),
            SessionEvent::CreateComplex => self.state.open_prompt(PromptOp::CreateComplex),
            SessionEvent::Rename => self.state.open_prompt(PromptOp::Rename),
            SessionEvent::Copy => self.state.open_prompt(PromptOp::Copy),
            SessionEvent::Delete => {
                self.state.delete_selected();
            }

            // Preview
            SessionEvent::ScrollUp => self.state.scroll_up(),
            SessionEvent::ScrollDown => self.state.scroll_down(),

            // Prompt
            SessionEvent::PromptChar(c) => self.state.prompt_char(c),
            SessionEvent::PromptBackspace => self.state.prompt_backspace(),
            SessionEvent::PromptCursorLeft => self.state.prompt_cursor_left(),
            SessionEvent::PromptCursorRight => self.state.prompt_cursor_right(),
            SessionEvent::PromptSubmit => self.state.submit_prompt(),

            SessionEvent::Key(_) | SessionEvent::Quit => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PostActionKind;
    use crate::messages::ui_events::Mode;
    use crate::storage::load_workspace;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Harness {
        ui_tx: mpsc::UnboundedSender<SessionEvent>,
        exec_result_tx: mpsc::UnboundedSender<ExecutionResult>,
        exec_cmd_rx: mpsc::UnboundedReceiver<ExecutionCommand>,
        render_rx: mpsc::UnboundedReceiver<RenderState>,
        handle: tokio::task::JoinHandle<Option<PostAction>>,
    }

    fn start(dir: &TempDir, mode: Mode) -> Harness {
        let molds = load_workspace(dir.path()).unwrap();
        let state = SessionState::new(dir.path(), molds, mode);

        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (exec_cmd_tx, exec_cmd_rx) = mpsc::unbounded_channel();
        let (exec_result_tx, exec_result_rx) = mpsc::unbounded_channel();
        let (render_tx, render_rx) = mpsc::unbounded_channel();

        let actor = SessionActor::new(state, exec_cmd_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, exec_result_rx));

        Harness {
            ui_tx,
            exec_result_tx,
            exec_cmd_rx,
            render_rx,
            handle,
        }
    }

    fn workspace() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("get-user.yaml"),
            "name: get-user\nurl: http://x/users/1\nmethod: GET\n",
        )
        .unwrap();
        dir
    }

    async fn next_render(h: &mut Harness) -> RenderState {
        h.render_rx.recv().await.unwrap()
    }

    #[tokio::test]
    async fn test_edit_mode_round_trip_then_quit() {
        let dir = workspace();
        let mut h = start(&dir, Mode::Select);
        assert_eq!(next_render(&mut h).await.mode, Mode::Select);

        h.ui_tx.send(SessionEvent::EnterEditMode).unwrap();
        assert_eq!(next_render(&mut h).await.mode, Mode::Edit);

        h.ui_tx.send(SessionEvent::Cancel).unwrap();
        let render = next_render(&mut h).await;
        assert_eq!(render.mode, Mode::Select);
        assert_eq!(render.active, ActiveView::List);

        h.ui_tx.send(SessionEvent::Cancel).unwrap();
        assert!(h.handle.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stopwatch_blocks_mutations_until_completion() {
        let dir = workspace();
        let mut h = start(&dir, Mode::Edit);
        next_render(&mut h).await;

        h.ui_tx.send(SessionEvent::RunSelected).unwrap();
        let id = match h.exec_cmd_rx.recv().await.unwrap() {
            ExecutionCommand::Execute { id, .. } => id,
            other => panic!("unexpected command {:?}", other),
        };
        assert_eq!(next_render(&mut h).await.active, ActiveView::Stopwatch);

        // Inert while running
        h.ui_tx.send(SessionEvent::Delete).unwrap();
        h.ui_tx.send(SessionEvent::Cancel).unwrap();
        let render = next_render(&mut h).await;
        assert_eq!(render.active, ActiveView::Stopwatch);
        assert_eq!(render.rows.len(), 1);
        assert!(dir.path().join("get-user.yaml").exists());

        h.exec_result_tx
            .send(ExecutionResult::Completed {
                id,
                status: 201,
                headers: vec![],
                body: "created".to_string(),
                time_ms: 9,
            })
            .unwrap();

        let action = h.handle.await.unwrap().unwrap();
        assert_eq!(action.kind, PostActionKind::PrintRequest);
        assert!(action.payload.contains("HTTP 201"));
        assert!(action.payload.contains("created"));
        assert!(matches!(h.exec_cmd_rx.recv().await, Some(ExecutionCommand::Shutdown)));
    }

    #[tokio::test]
    async fn test_hard_quit_during_execution() {
        let dir = workspace();
        let h = start(&dir, Mode::Select);

        h.ui_tx.send(SessionEvent::RunSelected).unwrap();
        h.ui_tx.send(SessionEvent::Quit).unwrap();
        assert!(h.handle.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_prompt_returns_post_action() {
        let dir = workspace();
        let h = start(&dir, Mode::Edit);

        h.ui_tx.send(SessionEvent::CreateSimple).unwrap();
        for c in "login".chars() {
            h.ui_tx.send(SessionEvent::PromptChar(c)).unwrap();
        }
        h.ui_tx.send(SessionEvent::PromptSubmit).unwrap();

        let action = h.handle.await.unwrap().unwrap();
        assert_eq!(action.kind, PostActionKind::CreateSimpleRequest);
        assert_eq!(action.payload, "login");
    }

    fn key(c: char) -> SessionEvent {
        SessionEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_keys_typed_ahead_follow_the_opened_prompt() {
        let dir = workspace();
        let mut h = start(&dir, Mode::Edit);
        next_render(&mut h).await;

        // Sent back to back: 'q' must land in the rename prompt, not quit the list
        h.ui_tx.send(key('r')).unwrap();
        h.ui_tx.send(key('q')).unwrap();

        let mut render = next_render(&mut h).await;
        while render.prompt.as_ref().map(|p| p.input.as_str()) != Some("get-userq") {
            render = next_render(&mut h).await;
        }
        assert_eq!(render.active, ActiveView::Prompt);

        h.ui_tx
            .send(SessionEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
            .unwrap();
        assert_eq!(next_render(&mut h).await.active, ActiveView::List);

        h.ui_tx
            .send(SessionEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)))
            .unwrap();
        assert!(h.handle.await.unwrap().is_none());
        assert!(dir.path().join("get-user.yaml").exists());
    }

    #[tokio::test]
    async fn test_ui_disconnect_ends_session() {
        let dir = workspace();
        let h = start(&dir, Mode::Select);
        drop(h.ui_tx);
        assert!(h.handle.await.unwrap().is_none());
    }
}
