//! goful - Actor-based manager for API request files
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - Session Layer - state machine processing events
//! - Execution Layer (Tokio) - async HTTP execution

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use goful::app::{PostAction, PostActionKind, SessionActor, SessionState};
use goful::config::{default_config_dir, load_config, Config};
use goful::constants::{APP_NAME, APP_VERSION};
use goful::editor::{open_in_editor, resolve_editor};
use goful::messages::ui_events::{ActiveView, Mode};
use goful::messages::{ExecutionCommand, ExecutionResult, RenderState, SessionEvent};
use goful::mold::ContentType;
use goful::network::ExecutionActor;
use goful::storage::{load_workspace, stage_new_request};
use goful::ui::{highlight_source, method_color};

#[derive(Parser)]
#[command(name = APP_NAME, version, about = "Manage API request files from the terminal")]
struct Cli {
    /// Workspace directory holding request files
    #[arg(long, global = true, env = "GOFUL_ROOT")]
    root: Option<PathBuf>,

    /// Config file (default: ~/.goful/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Editor used for create and edit
    #[arg(long, global = true)]
    editor: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage the requests in the workspace
    Manage {
        /// Start with mutating commands unlocked
        #[arg(long)]
        edit: bool,
    },
}

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_dir().join("config.toml"));
    let mut config = load_config(&config_path);
    if let Some(root) = cli.root.clone() {
        config.workspace = Some(root);
    }
    if let Some(editor) = cli.editor.clone() {
        config.editor = Some(editor);
    }

    // Initialize logging to file
    let log_file = config.log_file();
    let log_dir = log_file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let log_name = log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.log", APP_NAME));
    let file_appender = tracing_appender::rolling::never(&log_dir, log_name);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(level)
        .init();

    let edit = match cli.command {
        Some(Commands::Manage { edit }) => edit,
        None => false,
    };
    let initial_mode = if edit { Mode::Edit } else { Mode::Select };

    let root = config.workspace_root();
    let molds = load_workspace(&root)?;
    tracing::info!(root = %root.display(), count = molds.len(), "Workspace loaded");

    let post_action = run_session(&config, SessionState::new(root, molds, initial_mode)).await?;

    match post_action {
        Some(action) => handle_post_action(&config, action),
        None => Ok(()),
    }
}

/// Run one interactive session and return its post-action.
///
/// The terminal is restored before this returns.
async fn run_session(config: &Config, state: SessionState) -> anyhow::Result<Option<PostAction>> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal_guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (exec_cmd_tx, exec_cmd_rx) = mpsc::unbounded_channel::<ExecutionCommand>();
    let (exec_result_tx, exec_result_rx) = mpsc::unbounded_channel::<ExecutionResult>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn execution actor
    let execution_actor = ExecutionActor::new(exec_result_tx, config.timeout_secs());
    tokio::spawn(execution_actor.run(exec_cmd_rx));

    // Spawn session actor
    let session_actor = SessionActor::new(state, exec_cmd_tx, render_tx);
    let session = tokio::spawn(session_actor.run(ui_rx, exec_result_rx));

    // Run UI loop (synchronous with async polling)
    let ui_result = run_ui_loop(&mut terminal, &ui_tx, &mut render_rx);
    if ui_result.is_err() {
        let _ = ui_tx.send(SessionEvent::Quit);
    }

    let post_action = session.await.context("Session task failed")?;
    drop(terminal_guard);
    ui_result?;

    Ok(post_action)
}

/// Run the synchronous UI rendering loop until the session closes its render channel
fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: &mpsc::UnboundedSender<SessionEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Check for state updates (non-blocking)
        loop {
            match render_rx.try_recv() {
                Ok(state) => current_state = state,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            // Mapped by the session against its live view, not this snapshot
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let _ = ui_tx.send(SessionEvent::Key(key));
                }
            }
        }
    }
}

/// Carry out what the session asked for once the terminal is restored
fn handle_post_action(config: &Config, action: PostAction) -> anyhow::Result<()> {
    tracing::info!(kind = ?action.kind, payload = %action.payload, "Handling post-action");

    match action.kind {
        PostActionKind::CreateSimpleRequest | PostActionKind::CreateComplexRequest => {
            let editor = require_editor(config)?;
            let content_type = if action.kind == PostActionKind::CreateSimpleRequest {
                ContentType::Yaml
            } else {
                ContentType::Star
            };
            let path = stage_new_request(&config.staging_dir(), &action.payload, content_type)?;
            open_in_editor(&editor, &path)
        }
        PostActionKind::EditRequest => {
            let editor = require_editor(config)?;
            open_in_editor(&editor, &PathBuf::from(&action.payload))
        }
        PostActionKind::PrintRequest => {
            println!("{}", action.payload);
            Ok(())
        }
        PostActionKind::RenameRequest | PostActionKind::CopyRequest => {
            tracing::info!(name = %action.payload, "Already applied in session");
            Ok(())
        }
    }
}

fn require_editor(config: &Config) -> anyhow::Result<String> {
    resolve_editor(config.editor.as_deref()).ok_or_else(|| {
        tracing::error!("No editor configured");
        anyhow!("No editor found: pass --editor, set `editor` in the config file, or export $VISUAL or $EDITOR")
    })
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    match state.active {
        ActiveView::Preview => draw_preview(f, state, main_chunks[0]),
        ActiveView::Stopwatch => draw_stopwatch(f, state, main_chunks[0]),
        _ => draw_request_list(f, state, main_chunks[0]),
    }

    draw_status_bar(f, state, main_chunks[1]);

    if state.active == ActiveView::Prompt {
        draw_prompt_popup(f, state, area);
    }
}

fn draw_request_list(f: &mut Frame, state: &RenderState, area: Rect) {
    let border_style = if state.mode == Mode::Edit {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let count = if state.filter.is_empty() {
        format!("{} requests", state.total)
    } else {
        format!("{} of {} requests", state.rows.len(), state.total)
    };
    let title = format!(
        " {} v{} - {} ({}) ",
        APP_NAME, APP_VERSION, state.workspace_label, count
    );
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    if state.active == ActiveView::Filter || !state.filter.is_empty() {
        let style = if state.active == ActiveView::Filter {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        block = block.title_bottom(Line::from(Span::styled(format!(" /{} ", state.filter), style)));
    }

    if state.rows.is_empty() {
        let message = if state.total == 0 {
            "No request files found.\n\nPress 'i' then 'a' to create one."
        } else {
            "No requests match the filter.\n\nPress Esc to clear it."
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = state
        .rows
        .iter()
        .map(|row| {
            let method = row.method.trim().to_uppercase();
            let method_span = if row.method_valid {
                Span::styled(
                    format!("{:8}", method),
                    Style::default().fg(method_color(&method)).bold(),
                )
            } else {
                let shown = if method.is_empty() { "<method>" } else { method.as_str() };
                Span::styled(format!("{:8} ", shown), Style::default().fg(Color::Red))
            };
            let name_span = Span::styled(format!("{:24} ", row.name), Style::default().bold());
            let url_span = if row.url_valid {
                Span::styled(row.url.clone(), Style::default().fg(Color::Gray))
            } else if row.url.trim().is_empty() {
                Span::styled("<url>", Style::default().fg(Color::Red))
            } else {
                Span::styled(row.url.clone(), Style::default().fg(Color::Red))
            };

            ListItem::new(Line::from(vec![method_span, name_span, url_span]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));

    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_preview(f: &mut Frame, state: &RenderState, area: Rect) {
    let kind = state.preview_type.map(|t| t.as_str()).unwrap_or("");
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} [{}] ", state.preview_title, kind))
        .title_bottom(Line::from(" ↑/↓ scroll  q/Esc back ").right_aligned());

    let lines = match state.preview_type {
        Some(content_type) => highlight_source(&state.preview_raw, content_type),
        None => vec![Line::from(state.preview_raw.clone())],
    };

    let preview = Paragraph::new(lines)
        .block(block)
        .scroll((state.preview_scroll, 0));
    f.render_widget(preview, area);
}

fn draw_stopwatch(f: &mut Frame, state: &RenderState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(format!(" {} ", state.running_name));

    let elapsed = state.elapsed;
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Running request...",
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(format!(
            ":: Elapsed time {}.{:01}s",
            elapsed.as_secs(),
            elapsed.subsec_millis() / 100
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Ctrl+C to abort",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let mode_style = match state.mode {
        Mode::Select => Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
        Mode::Edit => Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
    };

    let hints = match state.active {
        ActiveView::Stopwatch => " Ctrl+C:quit ",
        ActiveView::Preview => " ↑/↓:scroll | q/Esc:back ",
        ActiveView::Prompt => " Enter:confirm | Esc:cancel ",
        ActiveView::Filter => " type to filter | Enter:apply | Esc:clear ",
        _ if !state.filter.is_empty() => " Enter:run | /:filter | Esc:clear filter ",
        _ => match state.mode {
            Mode::Select => " Enter:run | e:edit | p:preview | /:filter | i:edit mode | q:quit ",
            Mode::Edit => " a/A:new | r:rename | c:copy | d:delete | /:filter | Esc:select mode ",
        },
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", state.mode.as_str()), mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ];
    if let Some(status) = &state.status {
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_prompt_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(prompt) = &state.prompt else {
        return;
    };
    let popup_area = centered_rect(60, 20, area);

    let border_style = if prompt.error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(prompt.title.clone())
        .style(Style::default().bg(Color::Black));

    let mut lines = vec![Line::from(prompt.input.clone())];
    if let Some(error) = &prompt.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let input = Paragraph::new(lines).block(block);

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);

    // Cursor
    let typed = prompt.input[..prompt.cursor_position].chars().count() as u16;
    let max_x = popup_area.x + popup_area.width.saturating_sub(2);
    let cursor_x = (popup_area.x + typed + 1).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, popup_area.y + 1));
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
