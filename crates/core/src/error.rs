use brokerpad_jvm::ArchiveError;
use brokerpad_plugin::{EvaluationError, HandlerError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("type not found: {0}")]
    TypeNotFound(String),
    #[error("unknown isolation view: {0}")]
    UnknownView(String),
    #[error("registry {registry} cannot depend on {parent}: dependency cycle")]
    CyclicDependency { registry: String, parent: String },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("{0} is not tracked")]
    NotTracked(String),
    #[error("class {0} is not available")]
    UnknownClass(String),
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("generated class not the same as selected class (expected {expected}, got {actual})")]
    TypeMismatch { expected: String, actual: String },
    #[error(transparent)]
    Serialize(#[from] HandlerError),
    #[error("script engine crashed: {0}")]
    Panicked(String),
}
