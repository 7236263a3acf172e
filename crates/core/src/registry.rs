//! Registries own a base loader and hand out specialized views of it.
//!
//! The base loader grows in place; removals replace it with a fresh loader
//! built from the surviving units. Registries can depend on a parent registry,
//! in which case the parent's base loader becomes the delegation parent of
//! theirs. That link is captured when the loader is built, so a parent
//! removal is only seen by dependents after [`LoadedModuleRegistry::rebuild_dependents`].

use crate::error::LoaderError;
use crate::loader::{LoadedType, ModuleLoader};
use brokerpad_plugin::UnitLocation;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tracing::{debug, info};
use walkdir::WalkDir;
use xxhash_rust::xxh3::Xxh3;

/// Vendor archives layered on top of the base loader, per view kind.
///
/// Resolved once at start; never modified afterwards.
#[derive(Debug, Default, Clone)]
pub struct IsolationExtras {
    views: BTreeMap<String, Vec<UnitLocation>>,
}

impl IsolationExtras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(
        mut self,
        kind: impl Into<String>,
        locations: impl IntoIterator<Item = UnitLocation>,
    ) -> Self {
        self.views
            .insert(kind.into(), locations.into_iter().collect());
        self
    }

    /// Every `*.jar` below `<dir>/<kind>/` becomes an extra of view `<kind>`
    pub fn load(dir: &Path) -> Self {
        let mut extras = Self::new();
        let Ok(kinds) = std::fs::read_dir(dir) else {
            debug!("No isolation resources at {}", dir.display());
            return extras;
        };

        for kind_dir in kinds.flatten().map(|e| e.path()).filter(|p| p.is_dir()) {
            let Some(kind) = kind_dir.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let jars: Vec<UnitLocation> = WalkDir::new(&kind_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("jar"))
                .map(|e| UnitLocation::new(e.into_path()))
                .collect();
            debug!("Isolation view {} has {} archives", kind, jars.len());
            extras.views.insert(kind, jars);
        }

        extras
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn extras(&self, kind: &str) -> Option<&[UnitLocation]> {
        self.views.get(kind).map(Vec::as_slice)
    }
}

pub struct LoadedModuleRegistry {
    name: String,
    base: RwLock<Arc<ModuleLoader>>,
    parent: RwLock<Option<Arc<LoadedModuleRegistry>>>,
    dependents: Mutex<Vec<Weak<LoadedModuleRegistry>>>,
    extras: Arc<IsolationExtras>,
}

impl LoadedModuleRegistry {
    pub fn new(name: impl Into<String>, extras: Arc<IsolationExtras>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            base: RwLock::new(Arc::new(ModuleLoader::new(None))),
            parent: RwLock::new(None),
            dependents: Mutex::new(Vec::new()),
            extras,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extras(&self) -> &IsolationExtras {
        &self.extras
    }

    pub fn parent(&self) -> Option<Arc<LoadedModuleRegistry>> {
        self.parent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make `parent`'s contents visible through this registry.
    ///
    /// Rejects links that would make a registry its own transitive dependent.
    pub fn depend_on(self: &Arc<Self>, parent: &Arc<Self>) -> Result<(), LoaderError> {
        if parent.reaches(self) {
            return Err(LoaderError::CyclicDependency {
                registry: self.name.clone(),
                parent: parent.name.clone(),
            });
        }

        self.detach_link();
        parent
            .dependents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(self));
        *self.parent.write().unwrap_or_else(PoisonError::into_inner) = Some(parent.clone());
        self.rebuild();
        info!("Registry {} now depends on {}", self.name, parent.name);
        Ok(())
    }

    /// Drop the parent link and rebuild without it
    pub fn detach(self: &Arc<Self>) {
        if self.detach_link() {
            self.rebuild();
        }
    }

    fn detach_link(self: &Arc<Self>) -> bool {
        let Some(old) = self
            .parent
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return false;
        };
        old.dependents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|w| w.upgrade().is_some_and(|d| !Arc::ptr_eq(&d, self)));
        true
    }

    /// Whether `other` is this registry or one of its ancestors
    fn reaches(&self, other: &Arc<Self>) -> bool {
        if std::ptr::eq(self, Arc::as_ptr(other)) {
            return true;
        }
        self.parent().is_some_and(|p| p.reaches(other))
    }

    pub fn base_loader(&self) -> Arc<ModuleLoader> {
        self.base
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn locations(&self) -> Vec<UnitLocation> {
        self.base_loader().locations()
    }

    pub fn add_location(&self, location: UnitLocation) {
        debug!("Registry {}: adding {}", self.name, location);
        self.base_loader().add_location(location);
    }

    /// Remove one occurrence of `location`, rebuilding the base loader from
    /// the remaining units. Dependents are not rebuilt.
    pub fn remove_location(&self, location: &UnitLocation) -> bool {
        let mut base = self.base.write().unwrap_or_else(PoisonError::into_inner);
        let mut units = base.units();
        let Some(position) = units.iter().position(|u| u.location() == location) else {
            return false;
        };
        units.remove(position);
        *base = Arc::new(ModuleLoader::from_units(base.parent().cloned(), units));
        debug!("Registry {}: removed {}", self.name, location);
        true
    }

    /// Replace the base loader with an empty one, keeping the parent link
    pub fn clear(&self) {
        let mut base = self.base.write().unwrap_or_else(PoisonError::into_inner);
        *base = Arc::new(ModuleLoader::new(base.parent().cloned()));
    }

    /// Rebuild the base loader against the parent registry's current loader
    pub fn rebuild(&self) {
        let parent_loader = self.parent().map(|p| p.base_loader());
        let mut base = self.base.write().unwrap_or_else(PoisonError::into_inner);
        *base = Arc::new(ModuleLoader::from_units(parent_loader, base.units()));
    }

    /// Rebuild every live dependent, recursively
    pub fn rebuild_dependents(&self) {
        let dependents: Vec<Arc<LoadedModuleRegistry>> = {
            let mut guard = self.dependents.lock().unwrap_or_else(PoisonError::into_inner);
            guard.retain(|w| w.strong_count() > 0);
            guard.iter().filter_map(Weak::upgrade).collect()
        };
        for dependent in dependents {
            debug!("Rebuilding {} after change in {}", dependent.name, self.name);
            dependent.rebuild();
            dependent.rebuild_dependents();
        }
    }

    /// A fresh loader: a copy of the base loader plus the extras of `kind`.
    ///
    /// Never cached; each call returns an independent loader.
    pub fn specialized_view(&self, kind: &str) -> Result<ModuleLoader, LoaderError> {
        let extras = self
            .extras
            .extras(kind)
            .ok_or_else(|| LoaderError::UnknownView(kind.to_string()))?;
        let view = (*self.base_loader()).clone();
        for location in extras {
            view.add_location(location.clone());
        }
        Ok(view)
    }

    /// Loader to resolve through: the base loader, or the requested view
    pub fn view_for(&self, kind: Option<&str>) -> Result<Arc<ModuleLoader>, LoaderError> {
        match kind {
            None => Ok(self.base_loader()),
            Some(kind) => self.specialized_view(kind).map(Arc::new),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<LoadedType, LoaderError> {
        self.base_loader().resolve(name)
    }

    pub fn classpath(&self) -> Vec<PathBuf> {
        self.base_loader().classpath()
    }

    /// Hash of the owned unit list and of the classpath visible through the
    /// parent. Changes whenever either changes size or content.
    pub fn fingerprint(&self) -> u64 {
        let loader = self.base_loader();
        let owned = loader.locations();
        let inherited = loader.parent().map(|p| p.classpath()).unwrap_or_default();

        let mut hasher = Xxh3::new();
        for list in [
            owned.iter().map(UnitLocation::path).collect::<Vec<_>>(),
            inherited.iter().map(PathBuf::as_path).collect(),
        ] {
            hasher.update(&(list.len() as u64).to_le_bytes());
            for path in list {
                hasher.update(path.as_os_str().as_encoded_bytes());
                hasher.update(&[0]);
            }
        }
        hasher.digest()
    }
}

impl std::fmt::Debug for LoadedModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModuleRegistry")
            .field("name", &self.name)
            .field("locations", &self.locations())
            .field("parent", &self.parent().map(|p| p.name.clone()))
            .finish()
    }
}
