//! Appendable loading contexts.
//!
//! A [`ModuleLoader`] resolves type names against an ordered list of code
//! units, delegating to an optional parent first. Loaders only grow: dropping
//! a unit means building a fresh loader from the surviving units (see
//! [`crate::registry::LoadedModuleRegistry::remove_location`]).

use crate::error::LoaderError;
use brokerpad_jvm::CodeUnit;
use brokerpad_plugin::{ClassSummary, UnitLocation};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// A type resolved through a loader, with the unit that defined it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedType {
    pub summary: ClassSummary,
    pub location: UnitLocation,
}

impl LoadedType {
    pub fn name(&self) -> &str {
        &self.summary.name
    }
}

#[derive(Debug)]
pub struct ModuleLoader {
    units: RwLock<Vec<Arc<CodeUnit>>>,
    parent: Option<Arc<ModuleLoader>>,
}

impl ModuleLoader {
    pub fn new(parent: Option<Arc<ModuleLoader>>) -> Self {
        Self::from_units(parent, Vec::new())
    }

    pub fn with_locations(
        parent: Option<Arc<ModuleLoader>>,
        locations: impl IntoIterator<Item = UnitLocation>,
    ) -> Self {
        let units = locations
            .into_iter()
            .map(|location| Arc::new(CodeUnit::new(location)))
            .collect();
        Self::from_units(parent, units)
    }

    pub(crate) fn from_units(parent: Option<Arc<ModuleLoader>>, units: Vec<Arc<CodeUnit>>) -> Self {
        Self {
            units: RwLock::new(units),
            parent,
        }
    }

    pub fn parent(&self) -> Option<&Arc<ModuleLoader>> {
        self.parent.as_ref()
    }

    /// Append a unit. Visible to every later resolution through this loader
    /// and through loaders that use it as parent.
    pub fn add_location(&self, location: UnitLocation) {
        self.units
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(CodeUnit::new(location)));
    }

    pub(crate) fn units(&self) -> Vec<Arc<CodeUnit>> {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Owned locations in insertion order (parent locations excluded)
    pub fn locations(&self) -> Vec<UnitLocation> {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|unit| unit.location().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_location(&self, location: &UnitLocation) -> bool {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|unit| unit.location() == location)
    }

    /// Resolve a fully qualified type name, parent first.
    pub fn resolve(&self, name: &str) -> Result<LoadedType, LoaderError> {
        if let Some(parent) = &self.parent {
            match parent.resolve(name) {
                Err(LoaderError::TypeNotFound(_)) => {}
                found => return found,
            }
        }

        for unit in self.units() {
            if unit.contains(name) {
                let summary = unit.read_class(name)?;
                return Ok(LoadedType {
                    summary,
                    location: unit.location().clone(),
                });
            }
        }

        Err(LoaderError::TypeNotFound(name.to_string()))
    }

    /// Every visible archive path, parent chain first
    pub fn classpath(&self) -> Vec<PathBuf> {
        let mut paths = self
            .parent
            .as_ref()
            .map(|parent| parent.classpath())
            .unwrap_or_default();
        paths.extend(
            self.locations()
                .into_iter()
                .map(UnitLocation::into_path),
        );
        paths
    }
}

/// A clone is a new loader: same parent, a snapshot of the units, and an
/// independent unit list from then on.
impl Clone for ModuleLoader {
    fn clone(&self) -> Self {
        Self::from_units(self.parent.clone(), self.units())
    }
}
