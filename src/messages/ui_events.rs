//! UI events - messages from the UI layer to the session controller

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Which view the session is showing
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ActiveView {
    #[default]
    List,
    /// Terminal: a simple request is about to be created
    Create,
    /// Terminal: a scripted request is about to be created
    CreateComplex,
    /// Terminal: the selected request is handed back for editing
    Update,
    Preview,
    Prompt,
    /// Typing a list filter; the list narrows as it changes
    Filter,
    /// Executing; shows elapsed time
    Stopwatch,
}

/// List browsing mode. Mutating commands are only available in `Edit`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Mode {
    #[default]
    Select,
    Edit,
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Select => "SELECT",
            Mode::Edit => "EDIT",
        }
    }
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Raw key press, mapped against the live view and mode by the session
    Key(KeyEvent),

    // List navigation
    SelectNext,
    SelectPrev,
    SelectFirst,
    SelectLast,

    // Mode
    EnterEditMode,

    // Request actions
    RunSelected,
    EditSelected,
    PreviewSelected,

    // Mutations (edit mode)
    CreateSimple,
    CreateComplex,
    Rename,
    Copy,
    Delete,

    // Filter
    StartFilter,
    FilterChar(char),
    FilterBackspace,
    ApplyFilter,

    // Preview
    ScrollUp,
    ScrollDown,

    // Prompt input
    PromptChar(char),
    PromptBackspace,
    PromptCursorLeft,
    PromptCursorRight,
    PromptSubmit,

    // Back out of the current view; ends the session from the list
    Cancel,

    // Hard quit, no post-action
    Quit,
}

/// Convert a key event to a SessionEvent based on the current view
pub fn key_to_session_event(key: KeyEvent, active: ActiveView, mode: Mode) -> Option<SessionEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(SessionEvent::Quit);
    }

    match active {
        ActiveView::List => handle_list_keys(key, mode),
        ActiveView::Preview => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(SessionEvent::Cancel),
            KeyCode::Up | KeyCode::Char('k') => Some(SessionEvent::ScrollUp),
            KeyCode::Down | KeyCode::Char('j') => Some(SessionEvent::ScrollDown),
            _ => None,
        },
        ActiveView::Prompt => match key.code {
            KeyCode::Esc => Some(SessionEvent::Cancel),
            KeyCode::Enter => Some(SessionEvent::PromptSubmit),
            KeyCode::Backspace => Some(SessionEvent::PromptBackspace),
            KeyCode::Left => Some(SessionEvent::PromptCursorLeft),
            KeyCode::Right => Some(SessionEvent::PromptCursorRight),
            KeyCode::Char(c) => Some(SessionEvent::PromptChar(c)),
            _ => None,
        },
        ActiveView::Filter => match key.code {
            KeyCode::Esc => Some(SessionEvent::Cancel),
            KeyCode::Enter => Some(SessionEvent::ApplyFilter),
            KeyCode::Backspace => Some(SessionEvent::FilterBackspace),
            KeyCode::Up => Some(SessionEvent::SelectPrev),
            KeyCode::Down => Some(SessionEvent::SelectNext),
            KeyCode::Char(c) => Some(SessionEvent::FilterChar(c)),
            _ => None,
        },
        // Only the timer runs while a request is in flight
        ActiveView::Stopwatch => None,
        ActiveView::Create | ActiveView::CreateComplex | ActiveView::Update => None,
    }
}

/// Handle keys for the request list
fn handle_list_keys(key: KeyEvent, mode: Mode) -> Option<SessionEvent> {
    let common = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(SessionEvent::SelectPrev),
        KeyCode::Down | KeyCode::Char('j') => Some(SessionEvent::SelectNext),
        KeyCode::Home | KeyCode::Char('g') => Some(SessionEvent::SelectFirst),
        KeyCode::End | KeyCode::Char('G') => Some(SessionEvent::SelectLast),
        KeyCode::Enter => Some(SessionEvent::RunSelected),
        KeyCode::Char('e') => Some(SessionEvent::EditSelected),
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(SessionEvent::PreviewSelected),
        KeyCode::Char('/') => Some(SessionEvent::StartFilter),
        KeyCode::Esc | KeyCode::Char('q') => Some(SessionEvent::Cancel),
        _ => None,
    };
    if common.is_some() {
        return common;
    }

    match mode {
        Mode::Select => match key.code {
            KeyCode::Char('i') => Some(SessionEvent::EnterEditMode),
            _ => None,
        },
        Mode::Edit => match key.code {
            KeyCode::Char('a') => Some(SessionEvent::CreateSimple),
            KeyCode::Char('A') => Some(SessionEvent::CreateComplex),
            KeyCode::Char('r') => Some(SessionEvent::Rename),
            KeyCode::Char('c') => Some(SessionEvent::Copy),
            KeyCode::Char('d') => Some(SessionEvent::Delete),
            _ => None,
        },
    }
}
