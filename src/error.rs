// Error taxonomy for the Panka core. Every component wraps the underlying
// cause with contextual identity (tenant, key, path) before propagating —
// no component swallows an error, only the CLI shell prints one.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PankaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("missing stack.yaml in {0}")]
    MissingStackYaml(String),

    #[error("invalid kind: {0}")]
    InvalidKind(String),

    #[error("YAML syntax error in {path}: {source}")]
    YamlSyntax {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("duplicate component name {name:?} in stack {stack:?}")]
    DuplicateComponentName { stack: String, name: String },

    #[error("authentication failed")]
    AuthFailure,

    #[error("session expired at {0}")]
    Expired(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("lock held: {0}")]
    LockHeld(String),

    #[error("lock lost: {0}")]
    LockLost(String),

    #[error("lock not found: {0}")]
    LockNotFound(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend transient error: {0}")]
    BackendTransient(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Clone for PankaError {
    fn clone(&self) -> Self {
        match self {
            PankaError::Io(e) => PankaError::Internal(format!("io error: {e}")),
            PankaError::Validation(s) => PankaError::Validation(s.clone()),
            PankaError::PathNotFound(s) => PankaError::PathNotFound(s.clone()),
            PankaError::NotADirectory(s) => PankaError::NotADirectory(s.clone()),
            PankaError::MissingStackYaml(s) => PankaError::MissingStackYaml(s.clone()),
            PankaError::InvalidKind(s) => PankaError::InvalidKind(s.clone()),
            PankaError::YamlSyntax { path, source } => {
                PankaError::Validation(format!("YAML syntax error in {path}: {source}"))
            }
            PankaError::DuplicateComponentName { stack, name } => PankaError::DuplicateComponentName {
                stack: stack.clone(),
                name: name.clone(),
            },
            PankaError::AuthFailure => PankaError::AuthFailure,
            PankaError::Expired(s) => PankaError::Expired(s.clone()),
            PankaError::Forbidden(s) => PankaError::Forbidden(s.clone()),
            PankaError::LockHeld(s) => PankaError::LockHeld(s.clone()),
            PankaError::LockLost(s) => PankaError::LockLost(s.clone()),
            PankaError::LockNotFound(s) => PankaError::LockNotFound(s.clone()),
            PankaError::NotFound(s) => PankaError::NotFound(s.clone()),
            PankaError::BackendTransient(s) => PankaError::BackendTransient(s.clone()),
            PankaError::SerializationError(s) => PankaError::SerializationError(s.clone()),
            PankaError::AlreadyExists(s) => PankaError::AlreadyExists(s.clone()),
            PankaError::Cancelled => PankaError::Cancelled,
            PankaError::Internal(s) => PankaError::Internal(s.clone()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PankaError>;
