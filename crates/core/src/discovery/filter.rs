//! Extension-point filters: one strategy per supported contract.

use super::context::ScanContext;
use brokerpad_jvm::{AUTH_CALLBACK_CONTRACT, JsonPayloadHandler, MessageFormat, TemplateStyle};
use brokerpad_plugin::{ExtensionHandler, UnitLocation};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type found by a filter, paired with the handler that serves it.
///
/// Identity is the type name plus the owning archive: the same name found in
/// two archives is two entries.
#[derive(Clone)]
pub struct DiscoveredType {
    name: String,
    location: UnitLocation,
    filter: String,
    handler: Arc<dyn ExtensionHandler>,
}

impl DiscoveredType {
    pub fn new(
        name: impl Into<String>,
        location: UnitLocation,
        filter: impl Into<String>,
        handler: Arc<dyn ExtensionHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            filter: filter.into(),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &UnitLocation {
        &self.location
    }

    /// Id of the filter that reported this type
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn handler(&self) -> &Arc<dyn ExtensionHandler> {
        &self.handler
    }
}

impl PartialEq for DiscoveredType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.location == other.location
    }
}

impl Eq for DiscoveredType {}

impl Hash for DiscoveredType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.location.hash(state);
    }
}

impl PartialOrd for DiscoveredType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DiscoveredType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.location.cmp(&other.location))
    }
}

impl std::fmt::Debug for DiscoveredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveredType")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Strategy deciding which types of an archive satisfy one contract
pub trait ExtensionPointFilter: Send + Sync {
    fn id(&self) -> &str;

    fn scan(&self, context: &ScanContext) -> BTreeSet<DiscoveredType>;
}

/// Concrete classes having a given type among their transitive supertypes
#[derive(Debug, Clone)]
pub struct SupertypeFilter {
    id: String,
    contract: String,
    template: TemplateStyle,
    isolation: Option<String>,
}

impl SupertypeFilter {
    pub fn new(id: impl Into<String>, contract: impl Into<String>, template: TemplateStyle) -> Self {
        Self {
            id: id.into(),
            contract: contract.into(),
            template,
            isolation: None,
        }
    }

    pub fn with_isolation(mut self, isolation: Option<&str>) -> Self {
        self.isolation = isolation.map(str::to_string);
        self
    }

    pub fn message_format(format: MessageFormat) -> Self {
        Self::new(format.id(), format.contract(), format.template())
            .with_isolation(format.isolation())
    }

    pub fn auth() -> Self {
        Self::new("auth", AUTH_CALLBACK_CONTRACT, TemplateStyle::Constructor)
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }
}

impl ExtensionPointFilter for SupertypeFilter {
    fn id(&self) -> &str {
        &self.id
    }

    fn scan(&self, context: &ScanContext) -> BTreeSet<DiscoveredType> {
        context
            .classes()
            .filter(|class| class.is_concrete() && class.name != self.contract)
            .filter(|class| context.is_subtype_of(class, &self.contract))
            .map(|class| {
                let handler = JsonPayloadHandler::new(
                    class.name.clone(),
                    context.location().clone(),
                    self.template,
                )
                .with_isolation(self.isolation.as_deref());
                DiscoveredType::new(
                    class.name.clone(),
                    context.location().clone(),
                    self.id.clone(),
                    Arc::new(handler),
                )
            })
            .collect()
    }
}

/// Every public concrete top-level class; recognizes plain libraries
#[derive(Debug, Clone, Default)]
pub struct AnyClassFilter;

impl ExtensionPointFilter for AnyClassFilter {
    fn id(&self) -> &str {
        "class"
    }

    fn scan(&self, context: &ScanContext) -> BTreeSet<DiscoveredType> {
        context
            .classes()
            .filter(|class| class.is_public && class.is_concrete() && !class.name.contains('$'))
            .map(|class| {
                let handler = JsonPayloadHandler::new(
                    class.name.clone(),
                    context.location().clone(),
                    TemplateStyle::Constructor,
                );
                DiscoveredType::new(
                    class.name.clone(),
                    context.location().clone(),
                    self.id(),
                    Arc::new(handler),
                )
            })
            .collect()
    }
}
