//! Workspace store - loads request molds from a directory and persists
//! structural changes back to it.
//!
//! Writes go to a temporary file in the target directory that is then
//! atomically moved into place. When a rename replaces a file the old one is
//! removed only after the new one exists, so an interrupted operation leaves at
//! most one stale file and never a half-written document.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::constants::{STAR_TEMPLATE, YAML_TEMPLATE};
use crate::error::MoldError;
use crate::mold::declarative::yaml_scalar;
use crate::mold::{ContentType, RequestMold};

/// Load every request file directly under `root`, sorted by filename.
///
/// Files with other extensions are ignored; YAML files that fail to parse are
/// skipped with a warning.
pub fn load_workspace(root: &Path) -> Result<Vec<RequestMold>> {
    let mut filenames: Vec<String> = fs::read_dir(root)
        .with_context(|| format!("Failed to read workspace {}", root.display()))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ContentType::from_extension)
                .is_some()
        })
        .collect();
    filenames.sort();

    let mut molds = Vec::with_capacity(filenames.len());
    for filename in filenames {
        let path = root.join(&filename);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping unreadable request file");
                continue;
            }
        };
        match RequestMold::from_source(root, filename, &raw) {
            Ok(mold) => molds.push(mold),
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "Skipping request file"),
        }
    }

    tracing::info!(root = %root.display(), count = molds.len(), "Loaded workspace");
    Ok(molds)
}

/// Persist a renamed mold that replaces `previous` on disk.
///
/// The new document is written first; the previous file is removed only once
/// the write succeeded and only if the filename actually changed.
pub fn persist_rename(previous: &RequestMold, renamed: &RequestMold) -> Result<(), MoldError> {
    let new_path = renamed.path();
    let old_path = previous.path();

    if new_path != old_path && new_path.exists() {
        return Err(MoldError::AlreadyExists(renamed.filename.clone()));
    }

    atomic_write(&new_path, renamed.raw(), true)?;

    if new_path != old_path {
        if let Err(source) = fs::remove_file(&old_path) {
            tracing::warn!(file = %old_path.display(), error = %source, "Renamed file written but old file remains");
        }
    }

    tracing::info!(from = %previous.filename, to = %renamed.filename, "Persisted rename");
    Ok(())
}

/// Write a mold to a file that must not already exist
pub fn persist_new(mold: &RequestMold) -> Result<(), MoldError> {
    let path = mold.path();
    atomic_write(&path, mold.raw(), false)?;
    tracing::info!(file = %mold.filename, "Persisted new request");
    Ok(())
}

/// Write the template for a new request into `staging_dir` and return its path
pub fn stage_new_request(staging_dir: &Path, name: &str, content_type: ContentType) -> Result<PathBuf> {
    fs::create_dir_all(staging_dir)
        .with_context(|| format!("Failed to create {}", staging_dir.display()))?;

    let content = match content_type {
        ContentType::Yaml => YAML_TEMPLATE.replace("{name}", &yaml_scalar(name)),
        ContentType::Star => STAR_TEMPLATE.replace("{name}", name),
    };
    let filename = format!("{}.{}", name, content_type.extension());
    let path = staging_dir.join(&filename);

    atomic_write(&path, &content, false)
        .with_context(|| format!("Failed to create request file {}", filename))?;

    tracing::info!(file = %path.display(), "Staged new request");
    Ok(path)
}

fn atomic_write(path: &Path, content: &str, overwrite: bool) -> Result<(), MoldError> {
    let io_err = |source: std::io::Error| MoldError::Io {
        path: path.display().to_string(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(content.as_bytes()).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;

    let result = if overwrite {
        file.persist(path)
    } else {
        file.persist_noclobber(path)
    };

    result.map(|_| ()).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            MoldError::AlreadyExists(
                path.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )
        } else {
            io_err(e.error)
        }
    })
}
