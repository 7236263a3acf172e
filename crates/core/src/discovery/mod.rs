//! Discovery of extension-point implementations inside registered archives.

pub mod context;
pub mod engine;
pub mod filter;

pub use context::ScanContext;
pub use engine::ClassDiscoveryEngine;
pub use filter::{AnyClassFilter, DiscoveredType, ExtensionPointFilter, SupertypeFilter};
