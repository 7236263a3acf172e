//! Per-category archive management.
//!
//! A manager keeps three things consistent: the files in its directory, the
//! units registered on its registry, and the discovery cache derived from
//! them. Operations report to the user through [`Feedback`] and never leave
//! the manager unusable after a failure.

use crate::category::ModuleCategory;
use crate::discovery::{ClassDiscoveryEngine, DiscoveredType, ExtensionPointFilter};
use crate::error::{LoaderError, ManagerError};
use crate::loader::LoadedType;
use crate::registry::LoadedModuleRegistry;
use crate::storage::Storage;
use brokerpad_plugin::UnitLocation;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackLevel {
    Info,
    Warning,
    Error,
}

/// User-facing outcome of a manager operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
}

impl Feedback {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FeedbackLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FeedbackLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FeedbackLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == FeedbackLevel::Error
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            FeedbackLevel::Info => write!(f, "{}", self.message),
            FeedbackLevel::Warning => write!(f, "warning: {}", self.message),
            FeedbackLevel::Error => write!(f, "error: {}", self.message),
        }
    }
}

pub struct ModuleManager {
    category: ModuleCategory,
    dir: PathBuf,
    storage: Arc<dyn Storage>,
    registry: Arc<LoadedModuleRegistry>,
    discovery: ClassDiscoveryEngine,
    selected: Mutex<Option<DiscoveredType>>,
}

impl ModuleManager {
    pub fn new(
        category: ModuleCategory,
        dir: impl Into<PathBuf>,
        storage: Arc<dyn Storage>,
        registry: Arc<LoadedModuleRegistry>,
        filters: Vec<Arc<dyn ExtensionPointFilter>>,
    ) -> Result<Self, ManagerError> {
        let dir = dir.into();
        storage.make_dir(&dir)?;
        Ok(Self {
            category,
            dir,
            storage,
            discovery: ClassDiscoveryEngine::new(registry.clone(), filters),
            registry,
            selected: Mutex::new(None),
        })
    }

    /// Manager using the category's own filters
    pub fn for_category(
        category: ModuleCategory,
        dir: impl Into<PathBuf>,
        storage: Arc<dyn Storage>,
        registry: Arc<LoadedModuleRegistry>,
    ) -> Result<Self, ManagerError> {
        Self::new(category, dir, storage, registry, category.filters())
    }

    pub fn category(&self) -> ModuleCategory {
        self.category
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn registry(&self) -> &Arc<LoadedModuleRegistry> {
        &self.registry
    }

    pub fn discovery(&self) -> &ClassDiscoveryEngine {
        &self.discovery
    }

    /// File names of the archives currently stored, sorted
    pub fn tracked_files(&self) -> Result<Vec<String>, ManagerError> {
        Ok(self
            .archives()?
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect())
    }

    pub fn is_tracked(&self, file_name: &str) -> bool {
        self.registry
            .base_loader()
            .contains_location(&UnitLocation::new(self.dir.join(file_name)))
    }

    pub fn add(&self, file: &Path) -> Feedback {
        match self.try_add(file) {
            Ok(Some(stored)) => {
                info!("[{}] added {}", self.category, stored.display());
                Feedback::info(format!("Added {} to {}", display_name(file), self.category))
            }
            Ok(None) => Feedback::info(format!(
                "{} is already in {}",
                display_name(file),
                self.category
            )),
            Err(e) => {
                warn!("[{}] failed to add {}: {}", self.category, file.display(), e);
                Feedback::error(format!("Failed to add {}: {}", display_name(file), e))
            }
        }
    }

    fn try_add(&self, file: &Path) -> Result<Option<PathBuf>, ManagerError> {
        let name = display_name(file);
        if self.is_tracked(&name) {
            return Ok(None);
        }
        let stored = self.storage.copy(file, &self.dir)?;
        self.registry.add_location(UnitLocation::new(&stored));
        self.discovery.invalidate();
        Ok(Some(stored))
    }

    /// Remove a stored archive by file name (or any path with that file name)
    pub fn remove(&self, file: &Path) -> Vec<Feedback> {
        let name = display_name(file);
        match self.try_remove(&name) {
            Ok(lost) => {
                info!("[{}] removed {}", self.category, name);
                let mut feedback = vec![Feedback::info(format!(
                    "Removed {} from {}",
                    name, self.category
                ))];
                if let Some(lost) = lost {
                    feedback.push(Feedback::warning(format!(
                        "Selected class {} was provided by {} and is no longer available",
                        lost.name(),
                        name
                    )));
                }
                feedback
            }
            Err(e) => {
                warn!("[{}] failed to remove {}: {}", self.category, name, e);
                vec![Feedback::error(format!("Failed to remove {}: {}", name, e))]
            }
        }
    }

    fn try_remove(&self, name: &str) -> Result<Option<DiscoveredType>, ManagerError> {
        let stored = self.dir.join(name);
        let location = UnitLocation::new(&stored);
        if !self.registry.base_loader().contains_location(&location) && !stored.exists() {
            return Err(ManagerError::NotTracked(name.to_string()));
        }

        match self.storage.delete(&stored) {
            Err(e) if e.is_not_found() => {
                warn!("[{}] {} was already gone from disk", self.category, name);
            }
            other => other?,
        }
        self.registry.remove_location(&location);
        self.discovery.invalidate();

        let mut selected = self.selected.lock().unwrap_or_else(PoisonError::into_inner);
        if selected.as_ref().is_some_and(|t| t.location() == &location) {
            return Ok(selected.take());
        }
        Ok(None)
    }

    /// Re-register every archive in the directory, in name order, and
    /// re-derive discovery. Used after bulk changes made behind the
    /// manager's back.
    pub fn refresh(&self) -> Vec<Feedback> {
        let archives = match self.archives() {
            Ok(archives) => archives,
            Err(e) => {
                warn!("[{}] refresh failed: {}", self.category, e);
                return vec![Feedback::error(format!(
                    "Failed to refresh {}: {}",
                    self.category, e
                ))];
            }
        };

        self.registry.clear();
        for archive in &archives {
            self.registry.add_location(UnitLocation::new(archive));
        }
        self.discovery.invalidate();
        let discovered = self.discovery.all().len();
        info!(
            "[{}] refreshed: {} archives, {} types",
            self.category,
            archives.len(),
            discovered
        );

        let mut feedback = Vec::new();
        if let Some(lost) = self.revalidate_selection() {
            feedback.push(Feedback::warning(format!(
                "Selected class {} is no longer available",
                lost.name()
            )));
        }
        feedback
    }

    /// Refresh, then delete every stored archive and empty the registry
    pub fn delete_all(&self) -> Vec<Feedback> {
        let mut feedback = self.refresh();
        let archives = match self.archives() {
            Ok(archives) => archives,
            Err(e) => {
                feedback.push(Feedback::error(e.to_string()));
                return feedback;
            }
        };

        let mut deleted = 0;
        for archive in &archives {
            match self.storage.delete(archive) {
                Ok(()) => deleted += 1,
                Err(e) => feedback.push(Feedback::error(e.to_string())),
            }
        }
        self.registry.clear();
        self.discovery.invalidate();
        if let Some(lost) = self.take_selection() {
            feedback.push(Feedback::warning(format!(
                "Selected class {} is no longer available",
                lost.name()
            )));
        }

        feedback.push(Feedback::info(format!(
            "Deleted {} archives from {}",
            deleted, self.category
        )));
        feedback
    }

    /// Take ownership of an archive produced elsewhere
    pub fn adopt(&self, file: &Path) -> Feedback {
        let feedback = self.add(file);
        if !feedback.is_error() {
            self.refresh();
        }
        feedback
    }

    pub fn query(&self, needle: &str) -> Vec<DiscoveredType> {
        self.discovery.query(needle)
    }

    pub fn get_class(&self, name: &str) -> Option<DiscoveredType> {
        self.discovery.get_class(name)
    }

    /// Whether this category's filters find anything in an unregistered archive
    pub fn recognizes(&self, file: &Path) -> bool {
        self.discovery.recognizes(&UnitLocation::new(file))
    }

    /// [`Self::recognizes`], also resolving against archives that arrive
    /// together with `file` but are not registered yet
    pub fn recognizes_among(&self, file: &Path, companions: &[PathBuf]) -> bool {
        let companions: Vec<UnitLocation> = companions.iter().map(UnitLocation::new).collect();
        self.discovery.recognizes_among(&UnitLocation::new(file), &companions)
    }

    pub fn select(&self, name: &str) -> Result<DiscoveredType, ManagerError> {
        let found = self
            .get_class(name)
            .ok_or_else(|| ManagerError::UnknownClass(name.to_string()))?;
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = Some(found.clone());
        Ok(found)
    }

    pub fn selected(&self) -> Option<DiscoveredType> {
        self.selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take_selection(&self) -> Option<DiscoveredType> {
        self.selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Resolve the selected type through the view its handler asks for
    pub fn resolve_selected(&self) -> Option<Result<LoadedType, LoaderError>> {
        let selected = self.selected()?;
        Some(
            self.registry
                .view_for(selected.handler().isolation())
                .and_then(|loader| loader.resolve(selected.name())),
        )
    }

    /// Delete the backing directory and leave the registry chain
    pub fn close(&self) -> Result<(), ManagerError> {
        self.take_selection();
        self.registry.detach();
        self.registry.clear();
        self.storage.remove_dir(&self.dir)?;
        info!("[{}] closed {}", self.category, self.dir.display());
        Ok(())
    }

    fn archives(&self) -> Result<Vec<PathBuf>, ManagerError> {
        Ok(self
            .storage
            .list_files(&self.dir)?
            .into_iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("jar"))
            .collect())
    }

    /// Clear the selection if its type vanished from discovery
    fn revalidate_selection(&self) -> Option<DiscoveredType> {
        let mut selected = self.selected.lock().unwrap_or_else(PoisonError::into_inner);
        let still_there = selected.as_ref().is_some_and(|t| {
            self.discovery
                .all()
                .iter()
                .any(|d| d.name() == t.name() && d.location() == t.location())
        });
        if still_there { None } else { selected.take() }
    }
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::registry::IsolationExtras;
    use crate::storage::FsStorage;
    use brokerpad_jvm::testing::JarBuilder;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    const PROTO: &str = "com.google.protobuf.Message";

    struct Fixture {
        _src: TempDir,
        _store: TempDir,
        src: PathBuf,
        manager: ModuleManager,
    }

    fn fixture() -> Fixture {
        let src = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let registry = LoadedModuleRegistry::new("message", Arc::new(IsolationExtras::new()));
        let manager = ModuleManager::for_category(
            ModuleCategory::Message,
            store.path().join("message"),
            Arc::new(FsStorage),
            registry,
        )
        .unwrap();
        Fixture {
            src: src.path().to_path_buf(),
            _src: src,
            _store: store,
            manager,
        }
    }

    fn message_jar(dir: &Path, file: &str, class: &str) -> PathBuf {
        JarBuilder::new()
            .interface(PROTO, &[])
            .class(class, None, &[PROTO])
            .write(&dir.join(file))
            .unwrap()
    }

    #[test]
    fn test_add_is_idempotent() {
        let f = fixture();
        let jar = message_jar(&f.src, "orders.jar", "com.example.Order");

        assert_eq!(f.manager.add(&jar).level, FeedbackLevel::Info);
        assert_eq!(f.manager.add(&jar).level, FeedbackLevel::Info);
        assert_eq!(f.manager.registry().locations().len(), 1);
        assert_eq!(f.manager.tracked_files().unwrap(), vec!["orders.jar".to_string()]);
        assert_eq!(f.manager.query("order").len(), 1);
    }

    #[test]
    fn test_add_missing_file_reports_error() {
        let f = fixture();
        let feedback = f.manager.add(&f.src.join("missing.jar"));
        assert!(feedback.is_error());

        // still usable afterwards
        let jar = message_jar(&f.src, "orders.jar", "com.example.Order");
        assert!(!f.manager.add(&jar).is_error());
    }

    #[test]
    fn test_remove_clears_selection_of_removed_unit() {
        let f = fixture();
        let orders = message_jar(&f.src, "orders.jar", "com.example.Order");
        let users = message_jar(&f.src, "users.jar", "com.example.User");
        f.manager.add(&orders);
        f.manager.add(&users);

        f.manager.select("com.example.Order").unwrap();
        let feedback = f.manager.remove(&users);
        assert_eq!(feedback.len(), 1);
        assert!(f.manager.selected().is_some());

        let feedback = f.manager.remove(Path::new("orders.jar"));
        assert_eq!(feedback.len(), 2);
        assert_eq!(feedback[1].level, FeedbackLevel::Warning);
        assert!(f.manager.selected().is_none());
        assert!(f.manager.query("").is_empty());
    }

    #[test]
    fn test_remove_untracked_is_error_feedback() {
        let f = fixture();
        let feedback = f.manager.remove(Path::new("ghost.jar"));
        assert!(feedback[0].is_error());
    }

    #[test]
    fn test_remove_after_file_vanished_unregisters() {
        let f = fixture();
        f.manager.add(&message_jar(&f.src, "x.jar", "com.example.X"));
        std::fs::remove_file(f.manager.dir().join("x.jar")).unwrap();

        let feedback = f.manager.remove(Path::new("x.jar"));
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].level, FeedbackLevel::Info);
        assert!(f.manager.registry().locations().is_empty());
        assert!(f.manager.query("").is_empty());
        assert!(f.manager.remove(Path::new("x.jar"))[0].is_error());
    }

    #[test]
    fn test_add_file_already_in_directory_keeps_content() {
        let f = fixture();
        let inside = message_jar(f.manager.dir(), "x.jar", "com.example.X");
        let size = std::fs::metadata(&inside).unwrap().len();

        assert_eq!(f.manager.add(&inside).level, FeedbackLevel::Info);
        assert_eq!(std::fs::metadata(&inside).unwrap().len(), size);
        assert_eq!(f.manager.registry().locations().len(), 1);
        assert!(f.manager.get_class("com.example.X").is_some());
    }

    #[test]
    fn test_refresh_picks_up_external_changes() {
        let f = fixture();
        message_jar(f.manager.dir(), "b.jar", "com.example.B");
        message_jar(f.manager.dir(), "a.jar", "com.example.A");
        std::fs::write(f.manager.dir().join("notes.txt"), b"ignored").unwrap();

        assert!(f.manager.query("").is_empty());
        f.manager.refresh();

        let files: Vec<_> = f
            .manager
            .registry()
            .locations()
            .iter()
            .map(UnitLocation::file_name)
            .collect();
        assert_eq!(files, vec!["a.jar", "b.jar"]);
        assert_eq!(f.manager.query("").len(), 2);
    }

    #[test]
    fn test_delete_all_empties_everything() {
        let f = fixture();
        f.manager.add(&message_jar(&f.src, "a.jar", "com.example.A"));
        f.manager.add(&message_jar(&f.src, "b.jar", "com.example.B"));
        f.manager.select("com.example.A").unwrap();

        f.manager.delete_all();
        assert!(f.manager.tracked_files().unwrap().is_empty());
        assert!(f.manager.registry().locations().is_empty());
        assert!(f.manager.query("").is_empty());
        assert!(f.manager.selected().is_none());
    }

    #[test]
    fn test_select_unknown_class() {
        let f = fixture();
        assert!(matches!(
            f.manager.select("com.example.Nope"),
            Err(ManagerError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_close_removes_directory() {
        let f = fixture();
        f.manager.add(&message_jar(&f.src, "a.jar", "com.example.A"));
        f.manager.close().unwrap();
        assert!(!f.manager.dir().exists());
        assert!(f.manager.registry().locations().is_empty());
    }

    /// Storage whose copies always fail
    struct ReadOnlyStorage;

    impl Storage for ReadOnlyStorage {
        fn make_dir(&self, _: &Path) -> Result<(), StorageError> {
            Ok(())
        }
        fn copy(&self, src: &Path, _: &Path) -> Result<PathBuf, StorageError> {
            Err(StorageError::Io {
                op: "copy",
                path: src.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
        fn delete(&self, _: &Path) -> Result<(), StorageError> {
            Ok(())
        }
        fn list_files(&self, _: &Path) -> Result<BTreeSet<PathBuf>, StorageError> {
            Ok(BTreeSet::new())
        }
        fn remove_dir(&self, _: &Path) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_storage_failure_becomes_feedback() {
        let registry = LoadedModuleRegistry::new("auth", Arc::new(IsolationExtras::new()));
        let manager = ModuleManager::for_category(
            ModuleCategory::Auth,
            "/nonexistent/auth",
            Arc::new(ReadOnlyStorage),
            registry,
        )
        .unwrap();

        let feedback = manager.add(Path::new("/tmp/plugin.jar"));
        assert!(feedback.is_error());
        assert!(feedback.message.contains("plugin.jar"));
        assert!(manager.registry().locations().is_empty());
    }
}
