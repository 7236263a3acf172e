//! The generated Gradle project a fetch runs in.

use crate::error::FetchError;
use crate::spec::DependencySpec;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SETTINGS_FILE: &str = "settings.gradle";
pub const BUILD_FILE: &str = "build.gradle";
pub const STAGING_DIR: &str = "fetched-libs";
/// Gradle's project-local cache; survives cleanup
pub const CACHE_DIR: &str = ".gradle";

pub const PREPARE_TASK: &str = "prepareFetch";
pub const COPY_TASK: &str = "copyDependencies";

const PROJECT_NAME: &str = "brokerpad-fetch";

#[derive(Debug, Clone)]
pub struct GradleProject {
    dir: PathBuf,
}

impl GradleProject {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.dir.join(STAGING_DIR)
    }

    /// Project with only the task that prepares the staging folder
    pub async fn write_baseline(&self) -> Result<(), FetchError> {
        self.write(&render_build(None)).await
    }

    /// Project declaring `spec` and the task copying its runtime classpath
    pub async fn write_target(&self, spec: &DependencySpec) -> Result<(), FetchError> {
        self.write(&render_build(Some(spec))).await
    }

    async fn write(&self, build: &str) -> Result<(), FetchError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| FetchError::io(&self.dir, e))?;

        let settings = self.dir.join(SETTINGS_FILE);
        tokio::fs::write(&settings, format!("rootProject.name = '{PROJECT_NAME}'\n"))
            .await
            .map_err(|e| FetchError::io(&settings, e))?;

        let script = self.dir.join(BUILD_FILE);
        tokio::fs::write(&script, build)
            .await
            .map_err(|e| FetchError::io(&script, e))?;
        debug!("Wrote Gradle project at {}", self.dir.display());
        Ok(())
    }

    /// Archives currently in the staging folder
    pub async fn archives(&self) -> Result<BTreeSet<PathBuf>, FetchError> {
        let staging = self.staging_dir();
        let mut entries = match tokio::fs::read_dir(&staging).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(FetchError::io(&staging, e)),
        };

        let mut archives = BTreeSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FetchError::io(&staging, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jar") {
                archives.insert(path);
            }
        }
        Ok(archives)
    }

    /// Remove the generated files and the staging folder, keeping
    /// [`CACHE_DIR`] for the next fetch.
    pub async fn clean(&self) -> Result<(), FetchError> {
        for file in [SETTINGS_FILE, BUILD_FILE] {
            let path = self.dir.join(file);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(FetchError::io(&path, e)),
            }
        }

        let staging = self.staging_dir();
        match tokio::fs::remove_dir_all(&staging).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(FetchError::io(&staging, e)),
        }
        debug!("Cleaned Gradle project at {}", self.dir.display());
        Ok(())
    }
}

fn render_build(spec: Option<&DependencySpec>) -> String {
    let mut script = String::from(
        "plugins {\n    id 'java'\n}\n\n\
         repositories {\n    mavenLocal()\n    mavenCentral()\n}\n\n",
    );

    script.push_str(&format!(
        "tasks.register('{PREPARE_TASK}') {{\n    doLast {{\n        mkdir '{STAGING_DIR}'\n    }}\n}}\n"
    ));

    if let Some(spec) = spec {
        script.push_str("\ndependencies {\n");
        for declaration in spec.declarations() {
            script.push_str("    ");
            script.push_str(declaration);
            script.push('\n');
        }
        script.push_str("}\n");
        script.push_str(&format!(
            "\ntasks.register('{COPY_TASK}', Copy) {{\n    dependsOn '{PREPARE_TASK}'\n    \
             from configurations.runtimeClasspath\n    into '{STAGING_DIR}'\n}}\n"
        ));
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_baseline_has_no_copy_task() {
        let dir = tempdir().unwrap();
        let project = GradleProject::new(dir.path());
        project.write_baseline().await.unwrap();

        let build = std::fs::read_to_string(dir.path().join(BUILD_FILE)).unwrap();
        assert!(build.contains(PREPARE_TASK));
        assert!(!build.contains(COPY_TASK));
        assert!(!build.contains("dependencies {"));
        let settings = std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        assert!(settings.contains("rootProject.name"));
    }

    #[tokio::test]
    async fn test_target_declares_dependencies() {
        let dir = tempdir().unwrap();
        let project = GradleProject::new(dir.path());
        let spec = DependencySpec::parse("org.apache.thrift:libthrift:0.19.0").unwrap();
        project.write_target(&spec).await.unwrap();

        let build = std::fs::read_to_string(dir.path().join(BUILD_FILE)).unwrap();
        assert!(build.contains("    implementation 'org.apache.thrift:libthrift:0.19.0'\n"));
        assert!(build.contains(&format!("tasks.register('{COPY_TASK}', Copy)")));
        assert!(build.contains("from configurations.runtimeClasspath"));
        assert!(build.contains("mavenCentral()"));
    }

    #[tokio::test]
    async fn test_archives_lists_only_jars() {
        let dir = tempdir().unwrap();
        let project = GradleProject::new(dir.path());
        assert!(project.archives().await.unwrap().is_empty());

        std::fs::create_dir_all(project.staging_dir()).unwrap();
        std::fs::write(project.staging_dir().join("a.jar"), b"PK").unwrap();
        std::fs::write(project.staging_dir().join("notes.txt"), b"").unwrap();

        let archives = project.archives().await.unwrap();
        assert_eq!(archives.len(), 1);
        assert!(archives.contains(&project.staging_dir().join("a.jar")));
    }

    #[tokio::test]
    async fn test_clean_is_idempotent() {
        let dir = tempdir().unwrap();
        let project = GradleProject::new(dir.path().join("never-written"));
        project.clean().await.unwrap();
        project.clean().await.unwrap();
    }
}
