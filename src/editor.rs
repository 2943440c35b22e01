//! External editor hand-off

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Pick the editor: explicit choice first, then `$VISUAL`, then `$EDITOR`.
///
/// Returns `None` when nothing is configured; callers treat that as fatal.
pub fn resolve_editor(configured: Option<&str>) -> Option<String> {
    resolve_editor_from(configured, |key| std::env::var(key).ok())
}

fn resolve_editor_from(configured: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| env("VISUAL"))
        .or_else(|| env("EDITOR"))
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

/// Run `editor file` in the foreground with inherited standard streams.
///
/// The editor string may carry arguments (`code --wait`). Only a missing or
/// unlaunchable editor is an error; a non-zero exit is logged.
pub fn open_in_editor(editor: &str, file: &Path) -> Result<()> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("Editor command is empty");
    };

    tracing::info!(editor, file = %file.display(), "Opening editor");
    let status = Command::new(program)
        .args(parts)
        .arg(file)
        .status()
        .with_context(|| format!("Failed to launch editor '{}'", editor))?;

    if status.success() {
        tracing::info!(file = %file.display(), "Finished editing");
    } else {
        tracing::warn!(editor, ?status, file = %file.display(), "Editor exited with non-zero status");
    }
    Ok(())
}
