use thiserror::Error;

/// Errors raised by request mold operations.
#[derive(Debug, Error)]
pub enum MoldError {
    #[error("script has no meta:name: line to rewrite")]
    MissingNameTag,

    #[error("unsupported file extension: '{0}'")]
    UnsupportedExtension(String),

    #[error("invalid yaml in {file}: {message}")]
    InvalidYaml { file: String, message: String },

    #[error("rewritten document does not carry the name '{0}'")]
    NameNotApplied(String),

    #[error("file '{0}' already exists")]
    AlreadyExists(String),

    #[error("filesystem error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the request-name validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    Empty,

    #[error("name '{0}' is already taken")]
    Duplicate(String),

    #[error("name must not contain path separators")]
    PathSeparator,
}
