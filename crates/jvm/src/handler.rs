use crate::contract::TemplateStyle;
use brokerpad_plugin::{EvaluatedValue, ExtensionHandler, HandlerError, UnitLocation};

/// Default handler: the payload is the JSON rendering of the value's state.
#[derive(Debug, Clone)]
pub struct JsonPayloadHandler {
    type_name: String,
    location: UnitLocation,
    template: TemplateStyle,
    isolation: Option<String>,
}

impl JsonPayloadHandler {
    pub fn new(type_name: impl Into<String>, location: UnitLocation, template: TemplateStyle) -> Self {
        Self {
            type_name: type_name.into(),
            location,
            template,
            isolation: None,
        }
    }

    pub fn with_isolation(mut self, isolation: Option<&str>) -> Self {
        self.isolation = isolation.map(str::to_string);
        self
    }
}

impl ExtensionHandler for JsonPayloadHandler {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn location(&self) -> &UnitLocation {
        &self.location
    }

    fn isolation(&self) -> Option<&str> {
        self.isolation.as_deref()
    }

    fn serialize(&self, value: &EvaluatedValue) -> Result<Vec<u8>, HandlerError> {
        serde_json::to_vec(&value.fields).map_err(|e| HandlerError::Serialize {
            type_name: self.type_name.clone(),
            reason: e.to_string(),
        })
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<EvaluatedValue, HandlerError> {
        serde_json::from_slice(bytes)
            .map(|fields| EvaluatedValue::new(self.type_name.clone(), fields))
            .map_err(|e| HandlerError::Deserialize {
                type_name: self.type_name.clone(),
                reason: e.to_string(),
            })
    }

    fn pretty_print(&self, value: &EvaluatedValue) -> String {
        serde_json::to_string_pretty(&value.fields).unwrap_or_else(|_| value.fields.to_string())
    }

    fn generate_template(&self) -> String {
        self.template.render(&self.type_name)
    }
}
