//! Declared workflow parameters

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of value a parameter accepts. Enum symbols live on the variant, so
/// an enum input always carries at least one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "symbols", rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Boolean,
    Number,
    File,
    Enum(Vec<String>),
}

impl InputType {
    /// Maps a definition type name. `string`, unknown names and anything
    /// not covered below fall back to text.
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "boolean" | "bool" => InputType::Boolean,
            "int" | "long" | "number" => InputType::Number,
            "file" => InputType::File,
            _ => InputType::Text,
        }
    }

    /// Enum with `symbols`, or text when there are none.
    pub fn enumeration(symbols: Vec<String>) -> Self {
        if symbols.is_empty() {
            InputType::Text
        } else {
            InputType::Enum(symbols)
        }
    }

    pub fn symbols(&self) -> Option<&[String]> {
        match self {
            InputType::Enum(symbols) => Some(symbols),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Boolean => "boolean",
            InputType::Number => "number",
            InputType::File => "file",
            InputType::Enum(_) => "enum",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One declared parameter of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInput {
    /// Key of this input in the submitted job document.
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub input_type: InputType,
    /// Pre-populated value; `Null` when the definition has none.
    #[serde(default)]
    pub default: serde_json::Value,
    /// Declared as `T?` or `["null", T]`.
    #[serde(default)]
    pub optional: bool,
}

impl WorkflowInput {
    pub fn new(id: impl Into<String>, input_type: InputType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            input_type,
            default: serde_json::Value::Null,
            optional: false,
        }
    }

    pub fn symbols(&self) -> Option<&[String]> {
        self.input_type.symbols()
    }

    pub fn is_file(&self) -> bool {
        self.input_type == InputType::File
    }
}
