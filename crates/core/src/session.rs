//! One editing session: a manager per category over a shared registry chain.

use crate::category::ModuleCategory;
use crate::error::ManagerError;
use crate::manager::{Feedback, ModuleManager};
use crate::registry::{IsolationExtras, LoadedModuleRegistry};
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// What a saved project remembers about the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Selected type name per category
    #[serde(default)]
    pub selections: BTreeMap<ModuleCategory, String>,
    /// Archive file names tracked per category
    #[serde(default)]
    pub jars: BTreeMap<ModuleCategory, Vec<String>>,
}

impl ProjectManifest {
    /// Missing file means an empty manifest
    pub fn load(path: &Path) -> Result<Self, ManagerError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(crate::error::StorageError::Io {
                op: "read",
                path: path.to_path_buf(),
                source,
            }
            .into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ManagerError> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json).map_err(|source| {
            crate::error::StorageError::Io {
                op: "write",
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }
}

pub struct ModuleSession {
    root: PathBuf,
    managers: BTreeMap<ModuleCategory, Arc<ModuleManager>>,
}

impl ModuleSession {
    /// Open (or reopen) a session rooted at `root`.
    ///
    /// Message and auth registries depend on the common registry, so plain
    /// libraries are visible when resolving and discovering their types.
    pub fn open(
        root: impl Into<PathBuf>,
        storage: Arc<dyn Storage>,
        extras: Arc<IsolationExtras>,
    ) -> Result<Self, ManagerError> {
        let root = root.into();
        let common = LoadedModuleRegistry::new(ModuleCategory::Common.dir_name(), extras.clone());

        let mut managers = BTreeMap::new();
        for category in ModuleCategory::CLASSIFICATION_ORDER {
            let registry = match category {
                ModuleCategory::Common => common.clone(),
                _ => {
                    let registry = LoadedModuleRegistry::new(category.dir_name(), extras.clone());
                    registry.depend_on(&common)?;
                    registry
                }
            };
            let manager = ModuleManager::for_category(
                category,
                root.join(category.dir_name()),
                storage.clone(),
                registry,
            )?;
            managers.insert(category, Arc::new(manager));
        }

        let session = Self { root, managers };
        session.refresh_all();
        info!("Opened module session at {}", session.root.display());
        Ok(session)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manager(&self, category: ModuleCategory) -> &Arc<ModuleManager> {
        // every category is populated in `open`
        &self.managers[&category]
    }

    /// Managers in classification priority order
    pub fn classification_order(&self) -> Vec<Arc<ModuleManager>> {
        ModuleCategory::CLASSIFICATION_ORDER
            .iter()
            .map(|c| self.manager(*c).clone())
            .collect()
    }

    pub fn add(&self, category: ModuleCategory, file: &Path) -> Feedback {
        let feedback = self.manager(category).add(file);
        self.after_change(category);
        feedback
    }

    pub fn remove(&self, category: ModuleCategory, file: &Path) -> Vec<Feedback> {
        let feedback = self.manager(category).remove(file);
        self.after_change(category);
        feedback
    }

    pub fn delete_all(&self, category: ModuleCategory) -> Vec<Feedback> {
        let feedback = self.manager(category).delete_all();
        self.after_change(category);
        feedback
    }

    /// Refresh every manager, the common one first
    pub fn refresh_all(&self) -> Vec<Feedback> {
        let common = self.manager(ModuleCategory::Common);
        let mut feedback = common.refresh();
        common.registry().rebuild_dependents();
        for category in [ModuleCategory::Message, ModuleCategory::Auth] {
            feedback.extend(self.manager(category).refresh());
        }
        feedback
    }

    /// Dependents hold the common loader captured when they were built;
    /// anything but an append to it requires a rebuild.
    fn after_change(&self, category: ModuleCategory) {
        if category == ModuleCategory::Common {
            self.manager(category).registry().rebuild_dependents();
        }
    }

    pub fn manifest(&self) -> Result<ProjectManifest, ManagerError> {
        let mut manifest = ProjectManifest::default();
        for (category, manager) in &self.managers {
            manifest.jars.insert(*category, manager.tracked_files()?);
            if let Some(selected) = manager.selected() {
                manifest
                    .selections
                    .insert(*category, selected.name().to_string());
            }
        }
        Ok(manifest)
    }

    /// Re-select the classes a saved project refers to
    pub fn restore(&self, manifest: &ProjectManifest) -> Vec<Feedback> {
        let mut feedback = Vec::new();
        for (category, manager) in &self.managers {
            let Some(name) = manifest.selections.get(category) else {
                manager.take_selection();
                continue;
            };
            match manager.select(name) {
                Ok(_) => {}
                Err(e) => {
                    manager.take_selection();
                    feedback.push(Feedback::warning(format!(
                        "{category}: previously selected {e}"
                    )));
                }
            }
        }
        feedback
    }

    /// Close every manager, deleting the session's directories
    pub fn close(self) -> Result<(), ManagerError> {
        for category in ModuleCategory::CLASSIFICATION_ORDER {
            self.manager(category).close()?;
        }
        if let Err(e) = std::fs::remove_dir(&self.root) {
            warn!("Keeping session directory {}: {}", self.root.display(), e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStorage;
    use brokerpad_jvm::testing::JarBuilder;

    #[test]
    fn test_manifest_and_restore() {
        let src = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let session = ModuleSession::open(
            root.path().join("session"),
            Arc::new(FsStorage),
            Arc::new(IsolationExtras::new()),
        )
        .unwrap();

        let jar = JarBuilder::new()
            .interface("org.apache.thrift.TBase", &[])
            .class("com.example.Ping", None, &["org.apache.thrift.TBase"])
            .write(&src.path().join("ping.jar"))
            .unwrap();
        session.add(ModuleCategory::Message, &jar);
        session
            .manager(ModuleCategory::Message)
            .select("com.example.Ping")
            .unwrap();

        let manifest = session.manifest().unwrap();
        assert_eq!(
            manifest.selections.get(&ModuleCategory::Message).map(String::as_str),
            Some("com.example.Ping")
        );
        assert_eq!(manifest.jars[&ModuleCategory::Message], vec!["ping.jar".to_string()]);

        let path = root.path().join("project.json");
        manifest.save(&path).unwrap();
        assert_eq!(ProjectManifest::load(&path).unwrap(), manifest);

        session.remove(ModuleCategory::Message, Path::new("ping.jar"));
        let feedback = session.restore(&manifest);
        assert_eq!(feedback.len(), 1);
        assert!(session.manager(ModuleCategory::Message).selected().is_none());
    }

    #[test]
    fn test_close_deletes_directories() {
        let root = tempfile::tempdir().unwrap();
        let session_root = root.path().join("session");
        let session = ModuleSession::open(
            &session_root,
            Arc::new(FsStorage),
            Arc::new(IsolationExtras::new()),
        )
        .unwrap();
        assert!(session_root.join("message").is_dir());

        session.close().unwrap();
        assert!(!session_root.exists());
    }

    #[test]
    fn test_close_keeps_root_holding_foreign_files() {
        let root = tempfile::tempdir().unwrap();
        let session_root = root.path().join("session");
        let session = ModuleSession::open(
            &session_root,
            Arc::new(FsStorage),
            Arc::new(IsolationExtras::new()),
        )
        .unwrap();
        std::fs::write(session_root.join("notes.txt"), b"keep").unwrap();

        session.close().unwrap();
        assert!(!session_root.join("message").exists());
        assert!(session_root.join("notes.txt").is_file());
    }

    #[test]
    fn test_missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ProjectManifest::load(&dir.path().join("none.json")).unwrap();
        assert!(manifest.selections.is_empty());
    }
}
