mod common;

use brokerpad_core::{
    FsStorage, IsolationExtras, LoadedModuleRegistry, ModuleCategory, ModuleManager,
};
use common::{PROTO, class_jar, message_jar, registry};
use brokerpad_jvm::testing::JarBuilder;
use std::path::Path;
use std::sync::Arc;

fn names(types: Vec<brokerpad_core::DiscoveredType>) -> Vec<String> {
    types.into_iter().map(|t| t.name().to_string()).collect()
}

#[test]
fn test_end_to_end_register_and_remove() {
    let src = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    let manager = ModuleManager::for_category(
        ModuleCategory::Message,
        store.path(),
        Arc::new(FsStorage),
        registry("message"),
    )
    .unwrap();

    let x = message_jar(src.path(), "x.jar", "com.example.X");
    manager.add(x.path());

    let found = manager.query("");
    assert_eq!(names(found.clone()), vec!["com.example.X"]);
    assert_eq!(found[0].filter(), "protobuf");
    assert_eq!(found[0].location().path(), store.path().join("x.jar"));

    manager.remove(Path::new("x.jar"));
    assert!(manager.query("").is_empty());
    assert!(manager.get_class("com.example.X").is_none());
}

#[test]
fn test_discovery_completeness_after_mutation() {
    let src = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    let manager = ModuleManager::for_category(
        ModuleCategory::Message,
        store.path(),
        Arc::new(FsStorage),
        registry("message"),
    )
    .unwrap();

    manager.add(message_jar(src.path(), "a.jar", "com.example.A").path());
    manager.add(message_jar(src.path(), "b.jar", "com.example.B").path());
    assert_eq!(names(manager.query("")), vec!["com.example.A", "com.example.B"]);

    manager.add(message_jar(src.path(), "c.jar", "com.example.C").path());
    assert_eq!(
        names(manager.query("")),
        vec!["com.example.A", "com.example.B", "com.example.C"]
    );

    manager.remove(Path::new("b.jar"));
    assert_eq!(names(manager.query("")), vec!["com.example.A", "com.example.C"]);
}

#[test]
fn test_same_name_in_two_archives_is_two_entries() {
    let src = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    let manager = ModuleManager::for_category(
        ModuleCategory::Message,
        store.path(),
        Arc::new(FsStorage),
        registry("message"),
    )
    .unwrap();

    manager.add(message_jar(src.path(), "v1.jar", "com.example.Order").path());
    manager.add(message_jar(src.path(), "v2.jar", "com.example.Order").path());
    assert_eq!(manager.query("order").len(), 2);
}

#[test]
fn test_message_types_resolve_contract_from_common() {
    let src = tempfile::tempdir().unwrap();
    let store = tempfile::tempdir().unwrap();
    let common = registry("common");
    let message = registry("message");
    message.depend_on(&common).unwrap();

    let manager = ModuleManager::for_category(
        ModuleCategory::Message,
        store.path(),
        Arc::new(FsStorage),
        message,
    )
    .unwrap();

    let model = JarBuilder::new()
        .class("com.example.Order", None, &[PROTO])
        .write(&src.path().join("model.jar"))
        .unwrap();
    manager.add(&model);
    assert!(manager.query("").is_empty());

    // Contract arrives through the parent; the changed classpath invalidates the cache
    let runtime = JarBuilder::new()
        .interface(PROTO, &[])
        .write(&src.path().join("protobuf-java.jar"))
        .unwrap();
    common.add_location(brokerpad_plugin::UnitLocation::new(runtime));
    assert_eq!(names(manager.query("")), vec!["com.example.Order"]);
}

#[test]
fn test_scan_does_not_register() {
    let src = tempfile::tempdir().unwrap();
    let registry = LoadedModuleRegistry::new("common", Arc::new(IsolationExtras::new()));
    let store = tempfile::tempdir().unwrap();
    let manager = ModuleManager::for_category(
        ModuleCategory::Common,
        store.path(),
        Arc::new(FsStorage),
        registry.clone(),
    )
    .unwrap();

    let lib = class_jar(src.path(), "lib.jar", "org.lib.Client");
    assert!(manager.recognizes(lib.path()));
    assert!(registry.locations().is_empty());
    assert!(registry.resolve("org.lib.Client").is_err());
}
