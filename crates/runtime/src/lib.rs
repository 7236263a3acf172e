pub mod config;

pub use config::{BrokerpadConfig, ConfigError};

use brokerpad_core::{
    FsStorage, IsolationExtras, LoadedModuleRegistry, ManagerError, ModuleSession,
    RuntimeCompiler,
};
use brokerpad_gradle::{DependencyFetcher, GradleRunner};
use brokerpad_jvm::GroovyEngine;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

/// Opens the module session under the configured data directory, with
/// isolation extras read once from the isolation directory.
pub fn build_default_session(config: &BrokerpadConfig) -> Result<ModuleSession, ManagerError> {
    let extras = IsolationExtras::load(&config.isolation_dir());
    let kinds: Vec<&str> = extras.kinds().collect();
    tracing::debug!("Isolation views: {:?}", kinds);
    ModuleSession::open(config.session_dir(), Arc::new(FsStorage), Arc::new(extras))
}

/// Fetcher classifying into `session`'s managers, running the configured Gradle
pub fn build_fetcher(config: &BrokerpadConfig, session: &ModuleSession) -> Arc<DependencyFetcher> {
    Arc::new(DependencyFetcher::new(
        config.fetch_dir(),
        Arc::new(GradleRunner::new(config.gradle_command.clone())),
        session.classification_order(),
    ))
}

/// Compiler evaluating snippets with the configured Groovy against `registry`
pub fn build_compiler(
    config: &BrokerpadConfig,
    registry: Arc<LoadedModuleRegistry>,
) -> RuntimeCompiler {
    RuntimeCompiler::new(
        registry,
        Arc::new(GroovyEngine::new(config.groovy_command.clone())),
    )
}

/// Logging for `component` under the configured log directory.
///
/// Keep the guard alive for as long as log lines should reach the file.
pub fn init_logging(config: &BrokerpadConfig, component: &str, to_stderr: bool) -> WorkerGuard {
    brokerpad_core::logging::init_logging(&config.log_dir(), component, to_stderr)
}
