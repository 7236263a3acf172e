//! Contracts shared between the loading core and the JVM/build-tool backends.
//!
//! - [`UnitLocation`]: identity of one compiled-code archive
//! - [`ClassSummary`]: the structural shape of one type read from an archive
//! - [`ExtensionHandler`]: per-format serialize/deserialize/template contract
//! - [`ScriptEngine`]: evaluation of a user snippet against a classpath

pub mod class;
pub mod handler;
pub mod location;
pub mod script;

pub use class::ClassSummary;
pub use handler::{ExtensionHandler, HandlerError};
pub use location::UnitLocation;
pub use script::{EvaluatedValue, EvaluationError, ScriptEngine};
