use super::context::ScanContext;
use super::filter::{DiscoveredType, ExtensionPointFilter};
use crate::loader::ModuleLoader;
use crate::registry::LoadedModuleRegistry;
use brokerpad_plugin::UnitLocation;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

struct DiscoveryCache {
    fingerprint: u64,
    types: Arc<Vec<DiscoveredType>>,
}

/// Aggregates filter results over every unit registered on a registry.
///
/// The aggregate is cached against the registry fingerprint; any change in
/// membership triggers a full rescan of all units by all filters.
pub struct ClassDiscoveryEngine {
    registry: Arc<LoadedModuleRegistry>,
    filters: Vec<Arc<dyn ExtensionPointFilter>>,
    cache: Mutex<Option<DiscoveryCache>>,
    scans: AtomicUsize,
}

impl ClassDiscoveryEngine {
    pub fn new(
        registry: Arc<LoadedModuleRegistry>,
        filters: Vec<Arc<dyn ExtensionPointFilter>>,
    ) -> Self {
        Self {
            registry,
            filters,
            cache: Mutex::new(None),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<LoadedModuleRegistry> {
        &self.registry
    }

    /// Types whose name contains `needle`, ignoring case, sorted by name
    pub fn query(&self, needle: &str) -> Vec<DiscoveredType> {
        let needle = needle.to_lowercase();
        self.all()
            .iter()
            .filter(|t| t.name().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Exact lookup; `None` when no registered unit provides the type
    pub fn get_class(&self, name: &str) -> Option<DiscoveredType> {
        self.all().iter().find(|t| t.name() == name).cloned()
    }

    /// The full aggregate, rescanning first if membership changed
    pub fn all(&self) -> Arc<Vec<DiscoveredType>> {
        let fingerprint = self.registry.fingerprint();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = cache.as_ref() {
            if cached.fingerprint == fingerprint {
                return cached.types.clone();
            }
        }

        let types = Arc::new(self.rescan());
        *cache = Some(DiscoveryCache {
            fingerprint,
            types: types.clone(),
        });
        types
    }

    /// Drop the cached aggregate; the next query rescans
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of full passes run so far
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    /// Run every filter over one archive without registering it
    pub fn scan_unit(&self, location: &UnitLocation) -> BTreeSet<DiscoveredType> {
        self.scan_with_parent(location, self.registry.base_loader())
    }

    /// Whether at least one filter reports a type in the archive
    pub fn recognizes(&self, location: &UnitLocation) -> bool {
        self.recognizes_among(location, &[])
    }

    /// [`Self::recognizes`] for an archive arriving with others: supertypes
    /// and contracts may also come from `companions`, which stay unregistered.
    pub fn recognizes_among(&self, location: &UnitLocation, companions: &[UnitLocation]) -> bool {
        let base = self.registry.base_loader();
        let parent = if companions.is_empty() {
            base
        } else {
            Arc::new(ModuleLoader::with_locations(
                Some(base),
                companions.iter().filter(|c| *c != location).cloned(),
            ))
        };
        !self.scan_with_parent(location, parent).is_empty()
    }

    fn scan_with_parent(
        &self,
        location: &UnitLocation,
        parent: Arc<ModuleLoader>,
    ) -> BTreeSet<DiscoveredType> {
        match ScanContext::open(location, Some(parent)) {
            Ok(context) => self
                .filters
                .iter()
                .flat_map(|filter| filter.scan(&context))
                .collect(),
            Err(e) => {
                warn!("Cannot scan {}: {}", location, e);
                BTreeSet::new()
            }
        }
    }

    fn rescan(&self) -> Vec<DiscoveredType> {
        let start = std::time::Instant::now();
        self.scans.fetch_add(1, Ordering::Relaxed);

        let locations = self.registry.locations();
        let mut found = BTreeSet::new();
        for location in &locations {
            let unit_types = self.scan_unit(location);
            debug!("{} types in {}", unit_types.len(), location);
            found.extend(unit_types);
        }

        info!(
            "Discovery on {}: {} types in {} units ({:?})",
            self.registry.name(),
            found.len(),
            locations.len(),
            start.elapsed()
        );
        found.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::IsolationExtras;

    /// Reports one synthetic type per unit and counts invocations
    struct CountingFilter {
        calls: AtomicUsize,
    }

    impl ExtensionPointFilter for CountingFilter {
        fn id(&self) -> &str {
            "counting"
        }

        fn scan(&self, context: &ScanContext) -> BTreeSet<DiscoveredType> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            context
                .classes()
                .map(|c| {
                    let handler = Arc::new(brokerpad_jvm::JsonPayloadHandler::new(
                        c.name.clone(),
                        context.location().clone(),
                        brokerpad_jvm::TemplateStyle::Constructor,
                    ));
                    DiscoveredType::new(c.name.clone(), context.location().clone(), "counting", handler)
                })
                .collect()
        }
    }

    fn jar(dir: &std::path::Path, file: &str, class: &str) -> UnitLocation {
        let path = brokerpad_jvm::testing::JarBuilder::new()
            .class(class, None, &[])
            .write(&dir.join(file))
            .unwrap();
        UnitLocation::new(path)
    }

    #[test]
    fn test_identical_queries_scan_once() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LoadedModuleRegistry::new("messages", Arc::new(IsolationExtras::new()));
        registry.add_location(jar(dir.path(), "a.jar", "com.example.Alpha"));

        let filter = Arc::new(CountingFilter {
            calls: AtomicUsize::new(0),
        });
        let filters: Vec<Arc<dyn ExtensionPointFilter>> = vec![filter.clone()];
        let engine = ClassDiscoveryEngine::new(registry.clone(), filters);

        for _ in 0..10 {
            assert_eq!(engine.query("alpha").len(), 1);
        }
        assert_eq!(engine.scan_count(), 1);
        assert_eq!(filter.calls.load(Ordering::SeqCst), 1);

        // A new unit invalidates; the rescan covers every unit, not just the new one
        registry.add_location(jar(dir.path(), "b.jar", "com.example.Beta"));
        assert_eq!(engine.query("").len(), 2);
        assert_eq!(engine.scan_count(), 2);
        assert_eq!(filter.calls.load(Ordering::SeqCst), 3);

        engine.query("BETA");
        assert_eq!(engine.scan_count(), 2);
    }

    #[test]
    fn test_query_is_case_insensitive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LoadedModuleRegistry::new("messages", Arc::new(IsolationExtras::new()));
        registry.add_location(jar(dir.path(), "z.jar", "com.example.Zulu"));
        registry.add_location(jar(dir.path(), "a.jar", "com.example.Alpha"));

        let engine = ClassDiscoveryEngine::new(
            registry,
            vec![Arc::new(CountingFilter {
                calls: AtomicUsize::new(0),
            })],
        );

        let names: Vec<_> = engine
            .query("COM.EXAMPLE")
            .into_iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["com.example.Alpha", "com.example.Zulu"]);
        assert!(engine.query("nothing").is_empty());
        assert!(engine.get_class("com.example.Zulu").is_some());
        assert!(engine.get_class("com.example").is_none());
    }

    #[test]
    fn test_malformed_unit_does_not_fail_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.jar");
        std::fs::write(&broken, b"not a jar").unwrap();

        let registry = LoadedModuleRegistry::new("messages", Arc::new(IsolationExtras::new()));
        registry.add_location(UnitLocation::new(broken));
        registry.add_location(jar(dir.path(), "a.jar", "com.example.Alpha"));

        let engine = ClassDiscoveryEngine::new(
            registry,
            vec![Arc::new(CountingFilter {
                calls: AtomicUsize::new(0),
            })],
        );
        assert_eq!(engine.query("").len(), 1);
    }

    #[test]
    fn test_companions_supply_supertypes_without_registering() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = brokerpad_jvm::testing::JarBuilder::new()
            .interface("com.google.protobuf.Message", &[])
            .abstract_class(
                "com.google.protobuf.GeneratedMessage",
                None,
                &["com.google.protobuf.Message"],
            )
            .write(&dir.path().join("protobuf-java.jar"))
            .unwrap();
        let models = brokerpad_jvm::testing::JarBuilder::new()
            .class("com.acme.Order", Some("com.google.protobuf.GeneratedMessage"), &[])
            .write(&dir.path().join("acme-models.jar"))
            .unwrap();
        let runtime = UnitLocation::new(runtime);
        let models = UnitLocation::new(models);

        let registry = LoadedModuleRegistry::new("message", Arc::new(IsolationExtras::new()));
        let filters: Vec<Arc<dyn ExtensionPointFilter>> = vec![Arc::new(
            crate::discovery::SupertypeFilter::message_format(brokerpad_jvm::MessageFormat::Protobuf),
        )];
        let engine = ClassDiscoveryEngine::new(registry.clone(), filters);

        assert!(!engine.recognizes(&models));
        assert!(engine.recognizes_among(&models, &[models.clone(), runtime.clone()]));
        assert!(!engine.recognizes_among(&runtime, &[models.clone(), runtime.clone()]));
        assert!(registry.locations().is_empty());
    }

    #[test]
    fn test_invalidate_forces_rescan() {
        let registry = LoadedModuleRegistry::new("messages", Arc::new(IsolationExtras::new()));
        let engine = ClassDiscoveryEngine::new(registry, vec![]);

        engine.query("");
        engine.invalidate();
        engine.query("");
        assert_eq!(engine.scan_count(), 2);
    }
}
