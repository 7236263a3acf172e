//! Fetch-and-classify of dependency archives.
//!
//! Only one fetch or cleanup runs at a time. A second caller fails with
//! [`FetchError::AlreadyRunning`] instead of waiting, since both would
//! write the same project files.

use crate::error::FetchError;
use crate::project::{COPY_TASK, GradleProject, PREPARE_TASK};
use crate::runner::BuildToolRunner;
use crate::spec::DependencySpec;
use brokerpad_core::{Feedback, ModuleCategory, ModuleManager};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    FetchingBaseline,
    FetchingTarget,
    Classifying,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchState::Idle => "idle",
            FetchState::FetchingBaseline => "fetching baseline",
            FetchState::FetchingTarget => "fetching dependencies",
            FetchState::Classifying => "classifying",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Combined output of both tool runs
    pub output: String,
    /// Archives produced by the target run but not by the baseline
    pub new_archives: Vec<PathBuf>,
    /// Archives taken over by a manager, with the file stored there
    pub adopted: Vec<(ModuleCategory, PathBuf)>,
    /// Archives no manager recognized
    pub skipped: Vec<PathBuf>,
    pub feedback: Vec<Feedback>,
}

pub struct DependencyFetcher {
    project: GradleProject,
    runner: Arc<dyn BuildToolRunner>,
    managers: Vec<Arc<ModuleManager>>,
    busy: tokio::sync::Mutex<()>,
    state: Arc<Mutex<FetchState>>,
}

/// Puts the fetcher back to idle however the fetch ends
struct StateReset(Arc<Mutex<FetchState>>);

impl Drop for StateReset {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = FetchState::Idle;
    }
}

impl DependencyFetcher {
    /// `managers` are tried in the given order when classifying; put the
    /// general-purpose category last.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        runner: Arc<dyn BuildToolRunner>,
        managers: Vec<Arc<ModuleManager>>,
    ) -> Self {
        Self {
            project: GradleProject::new(project_dir),
            runner,
            managers,
            busy: tokio::sync::Mutex::new(()),
            state: Arc::new(Mutex::new(FetchState::Idle)),
        }
    }

    pub fn project(&self) -> &GradleProject {
        &self.project
    }

    pub fn state(&self) -> FetchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: FetchState) {
        debug!("Fetcher state: {}", state);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn is_busy(&self) -> bool {
        self.busy.try_lock().is_err()
    }

    /// Resolve `spec` and hand every newly produced archive to the first
    /// manager that recognizes it.
    pub async fn fetch(&self, spec: &DependencySpec) -> Result<FetchReport, FetchError> {
        let _busy = self.busy.try_lock().map_err(|_| FetchError::AlreadyRunning)?;
        let _reset = StateReset(self.state.clone());
        let dir = self.project.dir();

        self.set_state(FetchState::FetchingBaseline);
        self.project.write_baseline().await?;
        let mut output = self.runner.run(dir, PREPARE_TASK).await?;
        let baseline = self.project.archives().await?;
        debug!("Baseline holds {} archives", baseline.len());

        self.set_state(FetchState::FetchingTarget);
        self.project.write_target(spec).await?;
        output.push_str(&self.runner.run(dir, COPY_TASK).await?);
        let target = self.project.archives().await?;

        let new_archives: Vec<PathBuf> = target.difference(&baseline).cloned().collect();
        info!(
            "{} produced {} archives, {} new",
            self.runner.name(),
            target.len(),
            new_archives.len()
        );

        self.set_state(FetchState::Classifying);
        let managers = self.managers.clone();
        let archives = new_archives.clone();
        let companions: Vec<PathBuf> = target.into_iter().collect();
        let (adopted, skipped, feedback) =
            tokio::task::spawn_blocking(move || classify(&managers, &archives, &companions))
                .await
                .map_err(|e| FetchError::Aborted(e.to_string()))?;

        Ok(FetchReport {
            output,
            new_archives,
            adopted,
            skipped,
            feedback,
        })
    }

    /// [`Self::fetch`] bounded by `timeout`.
    ///
    /// On expiry the fetch keeps running in the background, holding the
    /// lock until the tool exits; callers see [`FetchError::TimedOut`].
    pub async fn fetch_with_timeout(
        self: &Arc<Self>,
        spec: DependencySpec,
        timeout: Duration,
    ) -> Result<FetchReport, FetchError> {
        let fetcher = self.clone();
        let task = tokio::spawn(async move { fetcher.fetch(&spec).await });
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(FetchError::Aborted(e.to_string())),
            Err(_) => {
                warn!("Dependency fetch exceeded {:?}", timeout);
                Err(FetchError::TimedOut(timeout))
            }
        }
    }

    /// Delete the generated project files, keeping Gradle's cache
    pub async fn cleanup(&self) -> Result<(), FetchError> {
        let _busy = self.busy.try_lock().map_err(|_| FetchError::AlreadyRunning)?;
        self.project.clean().await?;
        info!("Cleaned fetch project {}", self.project.dir().display());
        Ok(())
    }
}

type Classification = (Vec<(ModuleCategory, PathBuf)>, Vec<PathBuf>, Vec<Feedback>);

/// First manager to recognize an archive adopts it.
///
/// Every archive of the run is visible while recognizing, so a model whose
/// runtime arrives in the same fetch still reaches its category.
fn classify(
    managers: &[Arc<ModuleManager>],
    archives: &[PathBuf],
    companions: &[PathBuf],
) -> Classification {
    let mut adopted = Vec::new();
    let mut skipped = Vec::new();
    let mut feedback = Vec::new();

    for archive in archives {
        let Some(manager) = managers
            .iter()
            .find(|m| m.recognizes_among(archive, companions))
        else {
            info!("No category recognizes {}", archive.display());
            feedback.push(Feedback::warning(format!(
                "Skipped {}: no message, auth or library classes found",
                file_name(archive)
            )));
            skipped.push(archive.clone());
            continue;
        };

        let outcome = manager.adopt(archive);
        if outcome.is_error() {
            skipped.push(archive.clone());
        } else {
            if manager.category() == ModuleCategory::Common {
                manager.registry().rebuild_dependents();
            }
            adopted.push((manager.category(), manager.dir().join(file_name(archive))));
        }
        feedback.push(outcome);
    }
    (adopted, skipped, feedback)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
