use crate::location::UnitLocation;
use crate::script::EvaluatedValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to serialize {type_name}: {reason}")]
    Serialize { type_name: String, reason: String },
    #[error("failed to deserialize {type_name}: {reason}")]
    Deserialize { type_name: String, reason: String },
}

/// Per-format contract attached to every discovered type.
///
/// A handler knows how to turn a value produced by a user snippet into the
/// bytes sent to the broker and back.
pub trait ExtensionHandler: Send + Sync {
    /// Fully qualified name of the type this handler serves
    fn type_name(&self) -> &str;

    /// Archive the type was discovered in
    fn location(&self) -> &UnitLocation;

    /// Isolation view the type must be resolved through, if any
    fn isolation(&self) -> Option<&str> {
        None
    }

    fn serialize(&self, value: &EvaluatedValue) -> Result<Vec<u8>, HandlerError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<EvaluatedValue, HandlerError>;

    fn pretty_print(&self, value: &EvaluatedValue) -> String;

    /// Starting snippet offered to the user for this type
    fn generate_template(&self) -> String;
}
