#![allow(dead_code)]

use brokerpad_core::{IsolationExtras, LoadedModuleRegistry};
use brokerpad_jvm::testing::JarBuilder;
use brokerpad_plugin::UnitLocation;
use std::path::Path;
use std::sync::Arc;

pub const PROTO: &str = "com.google.protobuf.Message";

pub fn registry(name: &str) -> Arc<LoadedModuleRegistry> {
    LoadedModuleRegistry::new(name, Arc::new(IsolationExtras::new()))
}

/// Jar holding one concrete class
pub fn class_jar(dir: &Path, file: &str, class: &str) -> UnitLocation {
    UnitLocation::new(
        JarBuilder::new()
            .class(class, None, &[])
            .write(&dir.join(file))
            .unwrap(),
    )
}

/// Jar holding the protobuf contract and one message implementing it
pub fn message_jar(dir: &Path, file: &str, class: &str) -> UnitLocation {
    UnitLocation::new(
        JarBuilder::new()
            .interface(PROTO, &[])
            .class(class, None, &[PROTO])
            .write(&dir.join(file))
            .unwrap(),
    )
}
