//! Well-known extension-point contracts.

use serde::{Deserialize, Serialize};

/// Contract of broker authentication callback plugins
pub const AUTH_CALLBACK_CONTRACT: &str =
    "org.apache.kafka.common.security.auth.AuthenticateCallbackHandler";

/// How the starting snippet for a type is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateStyle {
    /// `T.newBuilder().build()`
    Builder,
    /// `new T()`
    Constructor,
}

impl TemplateStyle {
    pub fn render(self, type_name: &str) -> String {
        // Nested classes are referenced with '.' in source
        let source_name = type_name.replace('$', ".");
        match self {
            TemplateStyle::Builder => format!("{source_name}.newBuilder()\n    .build()"),
            TemplateStyle::Constructor => format!("new {source_name}()"),
        }
    }
}

/// Message encodings recognized in user-supplied message archives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Protobuf,
    Avro,
    Thrift,
}

impl MessageFormat {
    pub const ALL: [MessageFormat; 3] = [
        MessageFormat::Protobuf,
        MessageFormat::Avro,
        MessageFormat::Thrift,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MessageFormat::Protobuf => "protobuf",
            MessageFormat::Avro => "avro",
            MessageFormat::Thrift => "thrift",
        }
    }

    /// Supertype every generated message class of this format carries
    pub fn contract(self) -> &'static str {
        match self {
            MessageFormat::Protobuf => "com.google.protobuf.Message",
            MessageFormat::Avro => "org.apache.avro.specific.SpecificRecord",
            MessageFormat::Thrift => "org.apache.thrift.TBase",
        }
    }

    pub fn template(self) -> TemplateStyle {
        match self {
            MessageFormat::Protobuf | MessageFormat::Avro => TemplateStyle::Builder,
            MessageFormat::Thrift => TemplateStyle::Constructor,
        }
    }

    /// Formats whose runtime library ships vendored, conflicting copies
    pub fn isolation(self) -> Option<&'static str> {
        match self {
            MessageFormat::Protobuf => Some("protobuf"),
            MessageFormat::Avro => Some("avro"),
            MessageFormat::Thrift => None,
        }
    }
}
