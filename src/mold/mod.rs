//! Request molds - one request definition, independent of its on-disk format
//!
//! A mold is either declarative (typed YAML fields) or scripted (a Starlark
//! script with tagged metadata comments). All accessors dispatch on the
//! variant and never consult the other one.

pub mod declarative;
pub mod scripted;

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{STAR_EXTENSION, YAML_EXTENSIONS};
use crate::error::MoldError;
use crate::models::ResolvedRequest;

pub use declarative::DeclarativeRequest;
pub use scripted::{LiteralAssignments, ScriptEvaluator, ScriptedRequest};

/// On-disk encoding of a mold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Yaml,
    Star,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Yaml => "yaml",
            ContentType::Star => "star",
        }
    }

    /// Extension used when naming new files of this type
    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Yaml => "yaml",
            ContentType::Star => STAR_EXTENSION,
        }
    }

    pub fn from_extension(ext: &str) -> Option<ContentType> {
        if YAML_EXTENSIONS.contains(&ext) {
            Some(ContentType::Yaml)
        } else if ext == STAR_EXTENSION {
            Some(ContentType::Star)
        } else {
            None
        }
    }
}

/// The two payloads a mold can carry. Exactly one is present by construction.
#[derive(Clone, Debug, PartialEq)]
pub enum MoldKind {
    Declarative(DeclarativeRequest),
    Scripted(ScriptedRequest),
}

/// A request definition plus where it lives on disk
#[derive(Clone, Debug, PartialEq)]
pub struct RequestMold {
    pub kind: MoldKind,
    pub content_type: ContentType,
    pub root: PathBuf,
    pub filename: String,
}

impl RequestMold {
    /// Build a mold from file contents, classifying by the filename extension
    pub fn from_source(
        root: impl Into<PathBuf>,
        filename: impl Into<String>,
        raw: &str,
    ) -> Result<Self, MoldError> {
        let filename = filename.into();
        let ext = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let content_type = ContentType::from_extension(ext)
            .ok_or_else(|| MoldError::UnsupportedExtension(ext.to_string()))?;

        let kind = match content_type {
            ContentType::Yaml => {
                let request =
                    DeclarativeRequest::parse(raw).map_err(|e| MoldError::InvalidYaml {
                        file: filename.clone(),
                        message: e.to_string(),
                    })?;
                MoldKind::Declarative(request)
            }
            ContentType::Star => MoldKind::Scripted(ScriptedRequest::new(raw)),
        };

        Ok(RequestMold {
            kind,
            content_type,
            root: root.into(),
            filename,
        })
    }

    pub fn name(&self) -> String {
        match &self.kind {
            MoldKind::Declarative(req) => req.name.clone(),
            MoldKind::Scripted(req) => req.name(),
        }
    }

    pub fn url(&self) -> String {
        match &self.kind {
            MoldKind::Declarative(req) => req.url.clone(),
            MoldKind::Scripted(req) => req.url(),
        }
    }

    pub fn method(&self) -> String {
        match &self.kind {
            MoldKind::Declarative(req) => req.method.clone(),
            MoldKind::Scripted(req) => req.method(),
        }
    }

    /// Name of the request to run first. Carried as metadata only.
    pub fn prev_req(&self) -> String {
        match &self.kind {
            MoldKind::Declarative(req) => req.prev_req.clone(),
            MoldKind::Scripted(req) => req.prev_req(),
        }
    }

    pub fn raw(&self) -> &str {
        match &self.kind {
            MoldKind::Declarative(req) => &req.raw,
            MoldKind::Scripted(req) => &req.script,
        }
    }

    pub fn is_declarative(&self) -> bool {
        matches!(self.kind, MoldKind::Declarative(_))
    }

    /// Full path of the backing file
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.filename)
    }

    /// Point the mold at `new_name`: filename and in-document name together.
    ///
    /// Uniqueness is the caller's concern. On error nothing is mutated.
    pub fn rename(&mut self, new_name: &str) -> Result<(), MoldError> {
        let filename = renamed_filename(&self.filename, &self.name(), new_name, self.content_type);

        let kind = match &self.kind {
            MoldKind::Declarative(req) => {
                let raw = req.renamed_raw(new_name);
                let renamed = DeclarativeRequest::parse(&raw).map_err(|e| MoldError::InvalidYaml {
                    file: filename.clone(),
                    message: e.to_string(),
                })?;
                if renamed.name != new_name {
                    return Err(MoldError::NameNotApplied(new_name.to_string()));
                }
                MoldKind::Declarative(renamed)
            }
            MoldKind::Scripted(req) => {
                let script = req.renamed_script(new_name).ok_or(MoldError::MissingNameTag)?;
                MoldKind::Scripted(ScriptedRequest::new(script))
            }
        };

        self.kind = kind;
        self.filename = filename;
        Ok(())
    }

    /// Remove the backing file. The mold itself is left as is.
    pub fn delete_from_fs(&self) -> Result<(), MoldError> {
        let path = self.path();
        fs::remove_file(&path).map_err(|source| {
            tracing::error!(file = %self.filename, error = %source, "Failed to remove file");
            MoldError::Io {
                path: path.display().to_string(),
                source,
            }
        })
    }

    /// Resolve into an executable request using the built-in script reader
    pub fn resolve(&self) -> ResolvedRequest {
        self.resolve_with(&LiteralAssignments)
    }

    pub fn resolve_with(&self, evaluator: &dyn ScriptEvaluator) -> ResolvedRequest {
        match &self.kind {
            MoldKind::Declarative(req) => req.resolve(),
            MoldKind::Scripted(req) => evaluator.evaluate(&req.script),
        }
    }
}

/// Replace the name fragment of a filename's stem, or fall back to `<new>.<ext>`
fn renamed_filename(filename: &str, old_name: &str, new_name: &str, content_type: ContentType) -> String {
    let path = Path::new(filename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(content_type.extension());

    if !old_name.is_empty() && stem.contains(old_name) {
        format!("{}.{}", stem.replacen(old_name, new_name, 1), ext)
    } else {
        format!("{}.{}", new_name, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const GET_USER: &str = "name: get-user\nurl: http://x/users/1\nmethod: GET\n";
    const PING: &str = "\"\"\"\nmeta:name: ping\ndoc:url: http://x/ping\n\"\"\"\n";

    #[test]
    fn test_declarative_accessors() {
        let mold = RequestMold::from_source("/ws", "get-user.yaml", GET_USER).unwrap();
        assert!(mold.is_declarative());
        assert_eq!(mold.name(), "get-user");
        assert_eq!(mold.url(), "http://x/users/1");
        assert_eq!(mold.method(), "GET");
        assert_eq!(mold.raw(), GET_USER);
        assert_eq!(mold.content_type, ContentType::Yaml);
    }

    #[test]
    fn test_scripted_accessors() {
        let mold = RequestMold::from_source("/ws", "ping.star", PING).unwrap();
        assert!(!mold.is_declarative());
        assert_eq!(mold.name(), "ping");
        assert_eq!(mold.url(), "http://x/ping");
        assert_eq!(mold.method(), "");
        assert_eq!(mold.name(), mold.name());
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = RequestMold::from_source("/ws", "notes.txt", "hi").unwrap_err();
        assert!(matches!(err, MoldError::UnsupportedExtension(ext) if ext == "txt"));
    }

    #[test]
    fn test_rename_declarative() {
        let mut mold = RequestMold::from_source("/ws", "get-user.yaml", GET_USER).unwrap();
        mold.rename("get-user-v2").unwrap();
        assert_eq!(mold.name(), "get-user-v2");
        assert_eq!(mold.filename, "get-user-v2.yaml");
        assert!(mold.raw().contains("name: get-user-v2\n"));
        assert_eq!(mold.url(), "http://x/users/1");
    }

    #[test]
    fn test_rename_keeps_filename_prefix() {
        let mut mold = RequestMold::from_source("/ws", "01-get-user.yml", GET_USER).unwrap();
        mold.rename("fetch").unwrap();
        assert_eq!(mold.filename, "01-fetch.yml");
    }

    #[test]
    fn test_rename_scripted() {
        let mut mold = RequestMold::from_source("/ws", "ping.star", PING).unwrap();
        mold.rename("pong").unwrap();
        assert_eq!(mold.name(), "pong");
        assert_eq!(mold.filename, "pong.star");
        assert!(mold.raw().contains("meta:name: pong"));
    }

    #[test]
    fn test_rename_declarative_without_name_line() {
        let source = "---\nurl: http://x/users/1\nmethod: GET\n";
        let mut mold = RequestMold::from_source("/ws", "get-user.yaml", source).unwrap();
        mold.rename("get-user-v2").unwrap();
        assert_eq!(mold.filename, "get-user-v2.yaml");

        let reloaded = RequestMold::from_source("/ws", mold.filename.clone(), mold.raw()).unwrap();
        assert_eq!(reloaded.name(), "get-user-v2");
        assert_eq!(reloaded.url(), "http://x/users/1");
        assert_eq!(reloaded.method(), "GET");
    }

    #[test]
    fn test_rename_refused_when_result_would_not_parse() {
        let source = "{url: http://x/users/1, method: GET}\n";
        let mut mold = RequestMold::from_source("/ws", "flow.yaml", source).unwrap();
        let before = mold.clone();
        assert!(matches!(mold.rename("flow-v2"), Err(MoldError::InvalidYaml { .. })));
        assert_eq!(mold, before);
    }

    #[test]
    fn test_content_type_labels_outlive_the_value() {
        let label = Some(ContentType::Star).map(|t| t.as_str()).unwrap_or("");
        let ext = Some(ContentType::Yaml).map(|t| t.extension()).unwrap_or("");
        assert_eq!((label, ext), ("star", "yaml"));
    }

    #[test]
    fn test_failed_rename_leaves_mold_untouched() {
        let mut mold = RequestMold::from_source("/ws", "bare.star", "url = \"x\"\n").unwrap();
        let before = mold.clone();
        assert!(matches!(mold.rename("other"), Err(MoldError::MissingNameTag)));
        assert_eq!(mold, before);
    }

    #[test]
    fn test_clone_is_independent() {
        let source = RequestMold::from_source("/ws", "get-user.yaml", GET_USER).unwrap();
        let mut copy = source.clone();
        assert_eq!(copy.raw(), source.raw());

        copy.rename("other").unwrap();
        assert_eq!(source.name(), "get-user");
        assert_eq!(source.filename, "get-user.yaml");
        assert_eq!(source.raw(), GET_USER);
    }

    #[test]
    fn test_delete_from_fs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("get-user.yaml"), GET_USER).unwrap();
        let mold = RequestMold::from_source(dir.path(), "get-user.yaml", GET_USER).unwrap();

        mold.delete_from_fs().unwrap();
        assert!(!dir.path().join("get-user.yaml").exists());

        // A second delete fails and is reported, not panicked on
        assert!(matches!(mold.delete_from_fs(), Err(MoldError::Io { .. })));
        assert_eq!(mold.name(), "get-user");
    }

    #[test]
    fn test_resolve_declarative() {
        let mold = RequestMold::from_source("/ws", "get-user.yaml", GET_USER).unwrap();
        let resolved = mold.resolve();
        assert_eq!(resolved.url, "http://x/users/1");
        assert_eq!(resolved.method, "GET");
    }
}
