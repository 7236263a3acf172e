use crate::error::FetchError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tracing::{debug, info};

/// Runs one task of a build-tool project and returns its combined output.
#[async_trait]
pub trait BuildToolRunner: Send + Sync {
    fn name(&self) -> &str;

    /// A failing task is [`FetchError::Tool`] carrying the output verbatim.
    async fn run(&self, project_dir: &Path, task: &str) -> Result<String, FetchError>;
}

/// Runs the installed `gradle` (or a wrapper script) out of process
#[derive(Debug, Clone)]
pub struct GradleRunner {
    command: String,
}

impl GradleRunner {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for GradleRunner {
    fn default() -> Self {
        Self::new("gradle")
    }
}

#[async_trait]
impl BuildToolRunner for GradleRunner {
    fn name(&self) -> &str {
        &self.command
    }

    async fn run(&self, project_dir: &Path, task: &str) -> Result<String, FetchError> {
        info!("Running {} {} in {}", self.command, task, project_dir.display());
        let output = tokio::process::Command::new(&self.command)
            .args(["--console=plain", "-q", task])
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| FetchError::Launch {
                command: self.command.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            debug!("{} {} succeeded", self.command, task);
            Ok(combined)
        } else {
            Err(FetchError::Tool {
                task: task.to_string(),
                output: combined,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_command_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = GradleRunner::new("brokerpad-no-such-gradle");
        let err = runner.run(dir.path(), "prepareFetch").await.unwrap_err();
        assert!(matches!(err, FetchError::Launch { .. }));
    }
}
