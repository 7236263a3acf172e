//! JVM backend: reading code units (jar archives) and evaluating snippets.

pub mod archive;
pub mod classfile;
pub mod contract;
pub mod groovy;
pub mod handler;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use archive::{ArchiveError, CodeUnit};
pub use contract::{AUTH_CALLBACK_CONTRACT, MessageFormat, TemplateStyle};
pub use groovy::GroovyEngine;
pub use handler::JsonPayloadHandler;
