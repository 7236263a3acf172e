//! Snippet compilation against a registry's classpath.
//!
//! Evaluating a snippet runs arbitrary user code; every failure it can
//! produce, including a panicking engine, stops at [`RuntimeCompiler::compile`]
//! and comes back as a [`CompileError`].

use crate::discovery::DiscoveredType;
use crate::error::CompileError;
use crate::registry::LoadedModuleRegistry;
use brokerpad_plugin::{EvaluatedValue, ScriptEngine};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct RuntimeCompiler {
    registry: Arc<LoadedModuleRegistry>,
    engine: Arc<dyn ScriptEngine>,
}

impl RuntimeCompiler {
    pub fn new(registry: Arc<LoadedModuleRegistry>, engine: Arc<dyn ScriptEngine>) -> Self {
        Self { registry, engine }
    }

    /// Evaluate `source` and serialize the result with `expected`'s handler.
    ///
    /// The result must be an instance of exactly the expected type.
    pub fn compile(&self, source: &str, expected: &DiscoveredType) -> Result<Vec<u8>, CompileError> {
        let value = self.evaluate(source)?;

        if value.type_name != expected.name() {
            warn!(
                "Snippet produced {} but {} is selected",
                value.type_name,
                expected.name()
            );
            return Err(CompileError::TypeMismatch {
                expected: expected.name().to_string(),
                actual: value.type_name,
            });
        }

        let bytes = expected.handler().serialize(&value)?;
        debug!("Compiled {} into {} bytes", expected.name(), bytes.len());
        Ok(bytes)
    }

    /// Evaluate against the base view of the registry
    pub fn evaluate(&self, source: &str) -> Result<EvaluatedValue, CompileError> {
        let classpath = self.registry.base_loader().classpath();
        debug!(
            "Evaluating snippet with {} ({} classpath entries)",
            self.engine.name(),
            classpath.len()
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.engine.evaluate(source, &classpath)
        }));
        match outcome {
            Ok(result) => Ok(result?),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!("Script engine {} panicked: {}", self.engine.name(), reason);
                Err(CompileError::Panicked(reason))
            }
        }
    }

    /// [`Self::compile`] on the blocking pool, off the caller's thread
    pub async fn compile_async(
        &self,
        source: String,
        expected: DiscoveredType,
    ) -> Result<Vec<u8>, CompileError> {
        let compiler = self.clone();
        tokio::task::spawn_blocking(move || compiler.compile(&source, &expected))
            .await
            .map_err(|e| CompileError::Panicked(e.to_string()))?
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
