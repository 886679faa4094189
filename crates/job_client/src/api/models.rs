//! Wire models of the job API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const FILE_CLASS: &str = "File";

/// A job as reported by the server. Only `id` is interpreted; everything
/// else is carried through for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDescription {
    pub name: String,
    /// Definition filename relative to the store root.
    pub workflow: String,
    pub input: BTreeMap<String, JobValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRef {
    pub class: String,
    pub path: String,
}

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            class: FILE_CLASS.to_string(),
            path: path.into(),
        }
    }
}

/// One resolved input value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JobValue {
    File(FileRef),
    Scalar(serde_json::Value),
}

impl JobValue {
    pub fn null() -> Self {
        JobValue::Scalar(serde_json::Value::Null)
    }

    pub fn integer(value: i64) -> Self {
        JobValue::Scalar(serde_json::Value::from(value))
    }

    pub fn boolean(value: bool) -> Self {
        JobValue::Scalar(serde_json::Value::Bool(value))
    }

    pub fn file(path: impl Into<String>) -> Self {
        JobValue::File(FileRef::new(path))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JobValue::Scalar(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_serializes_file_and_scalar_inputs() {
        let mut input = BTreeMap::new();
        input.insert("reads".to_string(), JobValue::file("run-1/reads.fastq"));
        input.insert("count".to_string(), JobValue::integer(42));
        input.insert("verbose".to_string(), JobValue::boolean(true));
        input.insert("label".to_string(), JobValue::null());

        let description = JobDescription {
            name: "run-1".to_string(),
            workflow: "cwl/align.cwl".to_string(),
            input,
        };

        assert_eq!(
            serde_json::to_value(&description).unwrap(),
            json!({
                "name": "run-1",
                "workflow": "cwl/align.cwl",
                "input": {
                    "count": 42,
                    "label": null,
                    "reads": {"class": "File", "path": "run-1/reads.fastq"},
                    "verbose": true
                }
            })
        );
    }

    #[test]
    fn job_keeps_unknown_fields() {
        let job: Job = serde_json::from_value(json!({
            "id": "abc",
            "state": "Running",
            "log": "http://jobs/abc/log"
        }))
        .unwrap();

        assert_eq!(job.id, "abc");
        assert_eq!(job.state.as_deref(), Some("Running"));
        assert!(job.name.is_none());
        assert_eq!(job.extra["log"], json!("http://jobs/abc/log"));
    }

    #[test]
    fn file_objects_deserialize_as_file_refs() {
        let value: JobValue =
            serde_json::from_value(json!({"class": "File", "path": "a/b.txt"})).unwrap();
        assert_eq!(value, JobValue::file("a/b.txt"));
    }
}
