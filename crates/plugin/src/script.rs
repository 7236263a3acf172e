use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Value produced by evaluating a snippet: its runtime type name plus a
/// structural rendering of its state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedValue {
    pub type_name: String,
    pub fields: serde_json::Value,
}

impl EvaluatedValue {
    pub fn new(type_name: impl Into<String>, fields: serde_json::Value) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("compilation failed:\n{0}")]
    Compile(String),
    #[error("evaluation failed:\n{0}")]
    Runtime(String),
    #[error("could not launch script engine `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("script engine produced no value:\n{0}")]
    NoValue(String),
}

/// Embedded scripting facility.
///
/// Implementations evaluate `source` with exactly `classpath` visible and
/// return the single resulting value.
pub trait ScriptEngine: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        source: &str,
        classpath: &[PathBuf],
    ) -> Result<EvaluatedValue, EvaluationError>;
}
