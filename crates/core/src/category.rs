use crate::discovery::{AnyClassFilter, ExtensionPointFilter, SupertypeFilter};
use brokerpad_jvm::MessageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Kind of archives a manager holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleCategory {
    /// Generated message classes
    Message,
    /// Authentication plugins
    Auth,
    /// Plain libraries the other categories build on
    Common,
}

impl ModuleCategory {
    /// Order in which fetched archives are offered to managers; the
    /// general-purpose category comes last.
    pub const CLASSIFICATION_ORDER: [ModuleCategory; 3] = [
        ModuleCategory::Message,
        ModuleCategory::Auth,
        ModuleCategory::Common,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            ModuleCategory::Message => "message",
            ModuleCategory::Auth => "auth",
            ModuleCategory::Common => "common",
        }
    }

    pub fn filters(self) -> Vec<Arc<dyn ExtensionPointFilter>> {
        match self {
            ModuleCategory::Message => MessageFormat::ALL
                .into_iter()
                .map(|format| {
                    Arc::new(SupertypeFilter::message_format(format)) as Arc<dyn ExtensionPointFilter>
                })
                .collect(),
            ModuleCategory::Auth => vec![Arc::new(SupertypeFilter::auth())],
            ModuleCategory::Common => vec![Arc::new(AnyClassFilter)],
        }
    }
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ModuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "message" | "messages" => Ok(ModuleCategory::Message),
            "auth" => Ok(ModuleCategory::Auth),
            "common" | "dependency" | "dependencies" => Ok(ModuleCategory::Common),
            other => Err(format!("unknown category: {other}")),
        }
    }
}
