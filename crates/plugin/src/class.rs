use serde::{Deserialize, Serialize};

/// Structural shape of one type as read from a code unit.
///
/// Names are fully qualified, dot separated binary names (`a.b.Outer$Inner`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub name: String,
    /// `None` only for the root of the hierarchy
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub is_public: bool,
    pub is_interface: bool,
    pub is_abstract: bool,
}

impl ClassSummary {
    /// Simple name without the package prefix
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// A type that can be instantiated by a user snippet
    pub fn is_concrete(&self) -> bool {
        !self.is_interface && !self.is_abstract
    }

    /// Direct supertypes, super class first
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.super_name
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supertypes_order() {
        let summary = ClassSummary {
            name: "com.example.Order".to_string(),
            super_name: Some("com.example.Base".to_string()),
            interfaces: vec!["com.example.A".to_string(), "com.example.B".to_string()],
            is_public: true,
            is_interface: false,
            is_abstract: false,
        };

        let supers: Vec<_> = summary.supertypes().collect();
        assert_eq!(supers, vec!["com.example.Base", "com.example.A", "com.example.B"]);
        assert_eq!(summary.simple_name(), "Order");
        assert!(summary.is_concrete());
    }
}
