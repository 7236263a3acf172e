use anyhow::Context;
use brokerpad_core::{Feedback, ModuleCategory, ModuleManager, ModuleSession, ProjectManifest};
use brokerpad_runtime::BrokerpadConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub fn load_config(data_dir: Option<&Path>) -> anyhow::Result<BrokerpadConfig> {
    let config = match data_dir {
        Some(dir) => BrokerpadConfig::load_from(dir)?,
        None => BrokerpadConfig::load()?,
    };
    Ok(config)
}

/// The session plus the selections saved by earlier invocations
pub struct App {
    pub config: BrokerpadConfig,
    pub session: ModuleSession,
}

impl App {
    pub fn open(config: BrokerpadConfig) -> anyhow::Result<Self> {
        let session = brokerpad_runtime::build_default_session(&config)
            .with_context(|| format!("opening {}", config.session_dir().display()))?;

        let manifest_path = config.manifest_path();
        if manifest_path.exists() {
            let manifest = ProjectManifest::load(&manifest_path)?;
            report(&session.restore(&manifest));
        }
        Ok(Self { config, session })
    }

    pub fn manager(&self, category: ModuleCategory) -> &Arc<ModuleManager> {
        self.session.manager(category)
    }

    /// Persist selections and tracked archives
    pub fn save(&self) -> anyhow::Result<()> {
        let path = self.config.manifest_path();
        self.session.manifest()?.save(&path)?;
        info!("Saved project manifest to {}", path.display());
        Ok(())
    }
}

/// Print feedback; errors go to stderr
pub fn report(feedback: &[Feedback]) {
    for item in feedback {
        if item.is_error() {
            eprintln!("{item}");
        } else {
            println!("{item}");
        }
    }
}

pub fn has_errors(feedback: &[Feedback]) -> bool {
    feedback.iter().any(Feedback::is_error)
}
