//! Workflow definition parsing
//!
//! Turns one CWL-style YAML document into a [`Workflow`]. Parsing is pure:
//! the caller supplies the path the document was fetched from and its text.

use log::debug;
use serde_yaml::{Mapping, Value};

use crate::types::{InputType, Workflow, WorkflowError, WorkflowInput};

/// Parses definitions fetched from a store whose root is `store_root`.
#[derive(Debug, Clone)]
pub struct DefinitionParser {
    store_root: String,
}

impl DefinitionParser {
    /// `store_root` is the server path prefix (e.g. `/webdav/`) removed from
    /// document paths to form [`Workflow::filename`].
    pub fn new(store_root: impl Into<String>) -> Self {
        Self {
            store_root: store_root.into(),
        }
    }

    pub fn parse(&self, path: &str, content: &str) -> Result<Workflow, WorkflowError> {
        let failed = |cause: String| WorkflowError::ParseFailed {
            path: path.to_string(),
            cause,
        };

        let document: Value = serde_yaml::from_str(content).map_err(|e| failed(e.to_string()))?;
        let document = untag(&document);
        let Some(definition) = document.as_mapping() else {
            return Err(failed("definition is not a mapping".to_string()));
        };

        let name = definition
            .get(&yaml_key("label"))
            .and_then(scalar_string)
            .filter(|label| !label.trim().is_empty());
        let description = definition
            .get(&yaml_key("doc"))
            .map(doc_text)
            .unwrap_or_default();

        let section = InputsSection::classify(definition.get(&yaml_key("inputs"))).map_err(failed)?;
        let inputs = section
            .into_specs()
            .map_err(failed)?
            .into_iter()
            .map(|(id, spec)| spec.into_input(id))
            .collect();

        Ok(Workflow {
            name,
            description,
            filename: self.relative_filename(path),
            inputs,
        })
    }

    fn relative_filename(&self, path: &str) -> String {
        if self.store_root.is_empty() {
            return path.to_string();
        }
        path.strip_prefix(self.store_root.as_str())
            .unwrap_or(path)
            .to_string()
    }
}

/// Shape of the `inputs` section as written in the document.
enum InputsSection {
    Absent,
    ById(Mapping),
    Listed(Vec<Value>),
}

/// How a single input was declared: a bare type, or a full record.
enum InputSpec {
    Shorthand(Value),
    Record(Mapping),
}

impl InputsSection {
    fn classify(value: Option<&Value>) -> Result<Self, String> {
        match value.map(untag) {
            None | Some(Value::Null) => Ok(InputsSection::Absent),
            Some(Value::Mapping(mapping)) => Ok(InputsSection::ById(mapping.clone())),
            Some(Value::Sequence(items)) => Ok(InputsSection::Listed(items.clone())),
            Some(_) => Err("inputs must be a mapping or a list".to_string()),
        }
    }

    /// Canonical ordered id→declaration pairs. A repeated id in list form
    /// replaces the earlier declaration and keeps the earlier position.
    fn into_specs(self) -> Result<Vec<(String, InputSpec)>, String> {
        let by_id = match self {
            InputsSection::Absent => Mapping::new(),
            InputsSection::ById(mapping) => {
                let mut by_id = Mapping::new();
                for (key, spec) in mapping {
                    let id = scalar_string(&key)
                        .ok_or_else(|| "input ids must be scalars".to_string())?;
                    by_id.insert(Value::String(id), spec);
                }
                by_id
            }
            InputsSection::Listed(items) => {
                let mut by_id = Mapping::new();
                for (position, item) in items.into_iter().enumerate() {
                    let id = untag(&item)
                        .as_mapping()
                        .and_then(|record| record.get(&yaml_key("id")))
                        .and_then(scalar_string)
                        .ok_or_else(|| format!("input #{position} has no id"))?;
                    by_id.insert(Value::String(id), item);
                }
                by_id
            }
        };

        Ok(by_id
            .into_iter()
            .filter_map(|(key, spec)| {
                let id = scalar_string(&key)?;
                let spec = match untag(&spec) {
                    Value::Mapping(record) => InputSpec::Record(record.clone()),
                    other => InputSpec::Shorthand(other.clone()),
                };
                Some((id, spec))
            })
            .collect())
    }
}

impl InputSpec {
    fn into_input(self, id: String) -> WorkflowInput {
        let (input_type, optional) = match &self {
            InputSpec::Shorthand(value) => resolve_type(Some(value)),
            InputSpec::Record(record) => resolve_type(record.get(&yaml_key("type"))),
        };

        let mut input = WorkflowInput::new(id, input_type);
        input.optional = optional;

        if let InputSpec::Record(record) = &self {
            if let Some(label) = record
                .get(&yaml_key("label"))
                .and_then(scalar_string)
                .filter(|label| !label.is_empty())
            {
                input.name = label;
            }
            input.description = record
                .get(&yaml_key("doc"))
                .map(doc_text)
                .unwrap_or_default();
            if let Some(default) = record.get(&yaml_key("default")) {
                input.default = serde_json::to_value(default).unwrap_or_else(|e| {
                    debug!("Dropping default of input {}: {}", input.id, e);
                    serde_json::Value::Null
                });
            }
        }

        input
    }
}

/// Resolves a `type` field to an input type and whether `null` is allowed.
fn resolve_type(value: Option<&Value>) -> (InputType, bool) {
    let Some(value) = value.map(untag) else {
        return (InputType::Text, false);
    };

    match value {
        Value::Null => (InputType::Text, false),
        Value::String(name) => match name.trim().strip_suffix('?') {
            Some(base) => (InputType::from_type_name(base), true),
            None => (InputType::from_type_name(name), false),
        },
        Value::Mapping(record) => {
            let is_enum = record
                .get(&yaml_key("type"))
                .and_then(scalar_string)
                .map(|kind| kind.eq_ignore_ascii_case("enum"))
                .unwrap_or(false);
            if !is_enum {
                return (InputType::Text, false);
            }
            let symbols = record
                .get(&yaml_key("symbols"))
                .and_then(Value::as_sequence)
                .map(|symbols| symbols.iter().filter_map(scalar_string).collect())
                .unwrap_or_default();
            (InputType::enumeration(symbols), false)
        }
        Value::Sequence(alternatives) => {
            let concrete: Vec<&Value> = alternatives
                .iter()
                .filter(|alternative| !is_null_type(alternative))
                .collect();
            let nullable = concrete.len() != alternatives.len();
            match concrete.as_slice() {
                [single] => {
                    let (input_type, optional) = resolve_type(Some(single));
                    (input_type, optional || nullable)
                }
                _ => (InputType::Text, nullable),
            }
        }
        other => (
            scalar_string(other)
                .map(|name| InputType::from_type_name(&name))
                .unwrap_or_default(),
            false,
        ),
    }
}

fn is_null_type(value: &Value) -> bool {
    match untag(value) {
        Value::Null => true,
        Value::String(name) => name.eq_ignore_ascii_case("null"),
        _ => false,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// `doc` may be a string or a list of lines.
fn doc_text(value: &Value) -> String {
    match untag(value) {
        Value::Sequence(lines) => lines
            .iter()
            .filter_map(scalar_string)
            .collect::<Vec<_>>()
            .join("\n"),
        other => scalar_string(other).unwrap_or_default(),
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn yaml_key(value: &str) -> Value {
    Value::String(value.to_string())
}

/// Writes `workflow` back out as a definition document that parses to the
/// same inputs.
pub fn render_definition(workflow: &Workflow) -> Result<String, serde_yaml::Error> {
    let mut document = Mapping::new();
    if let Some(name) = &workflow.name {
        document.insert(yaml_key("label"), yaml_key(name));
    }
    if !workflow.description.is_empty() {
        document.insert(yaml_key("doc"), yaml_key(&workflow.description));
    }

    let mut inputs = Mapping::new();
    for input in &workflow.inputs {
        let mut record = Mapping::new();
        record.insert(yaml_key("type"), render_type(input));
        if input.name != input.id {
            record.insert(yaml_key("label"), yaml_key(&input.name));
        }
        if !input.description.is_empty() {
            record.insert(yaml_key("doc"), yaml_key(&input.description));
        }
        if !input.default.is_null() {
            record.insert(yaml_key("default"), serde_yaml::to_value(&input.default)?);
        }
        inputs.insert(yaml_key(&input.id), Value::Mapping(record));
    }
    document.insert(yaml_key("inputs"), Value::Mapping(inputs));

    serde_yaml::to_string(&document)
}

fn render_type(input: &WorkflowInput) -> Value {
    let base = match &input.input_type {
        InputType::Text => "string",
        InputType::Boolean => "boolean",
        InputType::Number => "int",
        InputType::File => "File",
        InputType::Enum(symbols) => {
            let mut record = Mapping::new();
            record.insert(yaml_key("type"), yaml_key("enum"));
            record.insert(
                yaml_key("symbols"),
                Value::Sequence(symbols.iter().map(|s| yaml_key(s)).collect()),
            );
            let record = Value::Mapping(record);
            return if input.optional {
                Value::Sequence(vec![yaml_key("null"), record])
            } else {
                record
            };
        }
    };

    if input.optional {
        yaml_key(&format!("{base}?"))
    } else {
        yaml_key(base)
    }
}
