//! Dynamic module loading for user-supplied message and auth archives.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   owns    ┌────────────────────────┐
//! │  ModuleManager   │──────────▶│  LoadedModuleRegistry  │──▶ ModuleLoader (base)
//! │  (per category)  │           │  (+ isolation extras)  │      ▲ parent
//! └────────┬─────────┘           └────────────────────────┘      │
//!          │ owns                                    dependent registries
//!          ▼
//! ┌──────────────────────┐  runs  ┌─────────────────────────┐
//! │ ClassDiscoveryEngine │───────▶│ ExtensionPointFilter[]  │
//! │ (fingerprint cache)  │        │ (message, auth, common) │
//! └──────────────────────┘        └─────────────────────────┘
//! ```
//!
//! [`RuntimeCompiler`] evaluates snippets against a registry's classpath and
//! [`ModuleSession`] wires one manager per [`ModuleCategory`].

pub mod category;
pub mod compiler;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod session;
pub mod storage;

pub use category::ModuleCategory;
pub use compiler::RuntimeCompiler;
pub use discovery::{ClassDiscoveryEngine, DiscoveredType, ExtensionPointFilter};
pub use error::{CompileError, LoaderError, ManagerError, StorageError};
pub use loader::{LoadedType, ModuleLoader};
pub use manager::{Feedback, FeedbackLevel, ModuleManager};
pub use registry::{IsolationExtras, LoadedModuleRegistry};
pub use session::{ModuleSession, ProjectManifest};
pub use storage::{FsStorage, Storage};
