use crate::loader::ModuleLoader;
use brokerpad_jvm::{ArchiveError, CodeUnit};
use brokerpad_plugin::{ClassSummary, UnitLocation};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Throwaway loading context for inspecting one archive.
///
/// The archive is read once and wrapped in a loader of its own whose parent is
/// the registry's current loader, so supertypes from already registered
/// archives resolve. Nothing is registered anywhere.
pub struct ScanContext {
    location: UnitLocation,
    loader: ModuleLoader,
    classes: HashMap<String, ClassSummary>,
}

impl ScanContext {
    pub fn open(
        location: &UnitLocation,
        parent: Option<Arc<ModuleLoader>>,
    ) -> Result<Self, ArchiveError> {
        let unit = Arc::new(CodeUnit::new(location.clone()));
        let classes = unit
            .summaries()?
            .into_iter()
            .map(|summary| (summary.name.clone(), summary))
            .collect();

        Ok(Self {
            location: location.clone(),
            loader: ModuleLoader::from_units(parent, vec![unit]),
            classes,
        })
    }

    pub fn location(&self) -> &UnitLocation {
        &self.location
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassSummary> {
        self.classes.values()
    }

    /// Whether `contract` is among the transitive supertypes of `class`.
    ///
    /// The contract itself must be loadable from this context. Supertypes
    /// that cannot be resolved end their branch of the walk.
    pub fn is_subtype_of(&self, class: &ClassSummary, contract: &str) -> bool {
        if !self.resolves(contract) {
            return false;
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = class.supertypes().map(str::to_string).collect();

        while let Some(name) = queue.pop_front() {
            if name == contract {
                return true;
            }
            if !visited.insert(name.clone()) {
                continue;
            }

            let supers: Vec<String> = match self.classes.get(&name) {
                Some(local) => local.supertypes().map(str::to_string).collect(),
                None => match self.loader.resolve(&name) {
                    Ok(loaded) => loaded.summary.supertypes().map(str::to_string).collect(),
                    Err(_) => continue,
                },
            };
            queue.extend(supers);
        }

        false
    }

    fn resolves(&self, name: &str) -> bool {
        self.classes.contains_key(name) || self.loader.resolve(name).is_ok()
    }
}
