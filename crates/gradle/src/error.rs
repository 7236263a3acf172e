use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("A dependency fetch or cleanup is already running")]
    AlreadyRunning,

    #[error("No dependencies declared")]
    EmptySpec,

    #[error("Line {line}: not a dependency declaration: {text}")]
    InvalidDeclaration { line: usize, text: String },

    #[error("Failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and failed; `output` is its combined output, untouched
    #[error("Task {task} failed:\n{output}")]
    Tool { task: String, output: String },

    #[error("Dependency fetch timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Dependency fetch aborted: {0}")]
    Aborted(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}
