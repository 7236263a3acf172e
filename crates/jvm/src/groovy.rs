//! Snippet evaluation through an out-of-process Groovy interpreter.
//!
//! The snippet is written next to a small wrapper script. The wrapper
//! evaluates it with the requested classpath and prints the resulting value's
//! class name and JSON rendering behind fixed markers, which are parsed back
//! into an [`EvaluatedValue`].

use brokerpad_plugin::{EvaluatedValue, EvaluationError, ScriptEngine};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

const TYPE_MARKER: &str = "@@BROKERPAD-TYPE@@";
const VALUE_MARKER: &str = "@@BROKERPAD-VALUE@@";

const WRAPPER: &str = r#"def shell = new GroovyShell(this.class.classLoader)
def value = shell.evaluate(new File(args[0]))
if (value == null) {
    System.err.println("snippet evaluated to null")
    System.exit(3)
}
println "@@BROKERPAD-TYPE@@" + value.getClass().getName()
println "@@BROKERPAD-VALUE@@" + groovy.json.JsonOutput.toJson(value)
"#;

pub struct GroovyEngine {
    command: String,
}

impl GroovyEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for GroovyEngine {
    fn default() -> Self {
        Self::new("groovy")
    }
}

impl ScriptEngine for GroovyEngine {
    fn name(&self) -> &str {
        "groovy"
    }

    fn evaluate(
        &self,
        source: &str,
        classpath: &[PathBuf],
    ) -> Result<EvaluatedValue, EvaluationError> {
        let workdir = tempfile::tempdir().map_err(|e| EvaluationError::Runtime(e.to_string()))?;
        let snippet = workdir.path().join("snippet.groovy");
        let wrapper = workdir.path().join("BrokerpadEval.groovy");
        std::fs::write(&snippet, source).map_err(|e| EvaluationError::Runtime(e.to_string()))?;
        std::fs::write(&wrapper, WRAPPER).map_err(|e| EvaluationError::Runtime(e.to_string()))?;

        let mut command = Command::new(&self.command);
        if !classpath.is_empty() {
            let joined = std::env::join_paths(classpath)
                .map_err(|e| EvaluationError::Runtime(e.to_string()))?;
            command.arg("-cp").arg(joined);
        }
        command.arg(&wrapper).arg(&snippet);

        debug!(
            "Evaluating snippet with {} ({} classpath entries)",
            self.command,
            classpath.len()
        );
        let output = command.output().map_err(|source| EvaluationError::Launch {
            command: self.command.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{stdout}{stderr}");

        if !output.status.success() {
            return Err(if stderr.contains("MultipleCompilationErrorsException") {
                EvaluationError::Compile(combined)
            } else {
                EvaluationError::Runtime(combined)
            });
        }

        parse_markers(&stdout).ok_or(EvaluationError::NoValue(combined))
    }
}

fn parse_markers(stdout: &str) -> Option<EvaluatedValue> {
    let mut type_name = None;
    let mut fields = None;
    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix(TYPE_MARKER) {
            type_name = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(VALUE_MARKER) {
            fields = Some(
                serde_json::from_str(rest.trim())
                    .unwrap_or_else(|_| serde_json::Value::String(rest.trim().to_string())),
            );
        }
    }
    Some(EvaluatedValue::new(type_name?, fields?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_markers() {
        let stdout = "some user println\n\
                      @@BROKERPAD-TYPE@@com.example.Order\n\
                      @@BROKERPAD-VALUE@@{\"id\":7}\n";

        let value = parse_markers(stdout).unwrap();
        assert_eq!(value.type_name, "com.example.Order");
        assert_eq!(value.fields, json!({"id": 7}));
    }

    #[test]
    fn test_parse_markers_requires_both() {
        assert!(parse_markers("@@BROKERPAD-TYPE@@com.example.Order\n").is_none());
        assert!(parse_markers("").is_none());
    }

    #[test]
    fn test_missing_interpreter_is_launch_error() {
        let engine = GroovyEngine::new("brokerpad-no-such-groovy-binary");
        let result = engine.evaluate("1 + 1", &[]);
        assert!(matches!(result, Err(EvaluationError::Launch { .. })));
    }
}
