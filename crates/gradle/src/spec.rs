use crate::error::FetchError;
use once_cell::sync::Lazy;
use regex::Regex;

/// `group:artifact:version` with an optional classifier
static COORDINATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.\-]+:[A-Za-z0-9_.\-]+:[A-Za-z0-9_.+\-]+(:[A-Za-z0-9_.\-]+)?$")
        .expect("valid coordinate regex")
});

static CONFIGURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(implementation|runtimeOnly|api|compileOnly)\b[\s(]")
        .expect("valid configuration regex")
});

/// Dependency declarations the user asked for, one Gradle line each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    declarations: Vec<String>,
}

impl DependencySpec {
    /// Parse one declaration per line. Bare coordinates become
    /// `implementation` declarations; lines naming a configuration are kept.
    pub fn parse(text: &str) -> Result<Self, FetchError> {
        let mut declarations = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if COORDINATE.is_match(line) {
                declarations.push(format!("implementation '{line}'"));
            } else if CONFIGURATION.is_match(line) {
                declarations.push(line.to_string());
            } else {
                return Err(FetchError::InvalidDeclaration {
                    line: index + 1,
                    text: line.to_string(),
                });
            }
        }

        if declarations.is_empty() {
            return Err(FetchError::EmptySpec);
        }
        Ok(Self { declarations })
    }

    pub fn declarations(&self) -> &[String] {
        &self.declarations
    }
}
