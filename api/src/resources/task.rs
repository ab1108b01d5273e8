use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::HashMap, fmt, str::FromStr};

use crate::{
    error::{Error, Result},
    resources::file::{Id as FileId, FileRef},
};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub String);

impl FromStr for Id {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        let string = string.trim();
        if string.is_empty() {
            Err(Error::BadResourceId { kind: "task" })
        } else {
            Ok(Self(string.to_owned()))
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Draft,
    Queued,
    Running,
    Completed,
    Failed,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed | Status::Aborted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(match self {
            Status::Draft => "DRAFT",
            Status::Queued => "QUEUED",
            Status::Running => "RUNNING",
            Status::Completed => "COMPLETED",
            Status::Failed => "FAILED",
            Status::Aborted => "ABORTED",
            Status::Unknown => "UNKNOWN",
        })
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        match string.trim().to_uppercase().as_str() {
            "DRAFT" => Ok(Status::Draft),
            "QUEUED" => Ok(Status::Queued),
            "RUNNING" => Ok(Status::Running),
            "COMPLETED" => Ok(Status::Completed),
            "FAILED" => Ok(Status::Failed),
            "ABORTED" => Ok(Status::Aborted),
            _ => Err(Error::BadTaskStatus {
                status: string.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Price {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: f64,
}

// The platform sends amounts as decimal strings.
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(amount) => Ok(amount),
        Amount::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Task {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub outputs: Map<String, Value>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl Task {
    /// Every file referenced by the outputs, including secondary files, deduplicated by id in
    /// order of first appearance.
    pub fn output_files(&self) -> Vec<FileRef> {
        let mut files = Vec::new();
        for value in self.outputs.values() {
            collect_files(value, &mut files);
        }
        let mut seen = std::collections::HashSet::new();
        files.retain(|file: &FileRef| seen.insert(file.id.clone()));
        files
    }

    /// Price of the task, zero while it has not been charged.
    pub fn cost(&self) -> f64 {
        self.price.as_ref().map_or(0.0, |price| price.amount)
    }

    /// The `app` segment of `owner/project/app` or `owner/project/app/revision`.
    pub fn app_name(&self) -> Option<&str> {
        let app = self.app.as_deref()?;
        let mut segments = app.rsplit('/');
        let last = segments.next()?;
        if last.chars().all(|c| c.is_ascii_digit()) {
            segments.next()
        } else {
            Some(last)
        }
    }
}

fn collect_files(value: &Value, files: &mut Vec<FileRef>) {
    match value {
        Value::Array(values) => values.iter().for_each(|value| collect_files(value, files)),
        Value::Object(object) if object.get("class").and_then(Value::as_str) == Some("File") => {
            if let Some(path) = object.get("path").and_then(Value::as_str) {
                files.push(FileRef {
                    id: FileId(path.to_owned()),
                    name: object
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                });
            }
            if let Some(secondary) = object.get("secondaryFiles") {
                collect_files(secondary, files);
            }
        }
        _ => {}
    }
}

/// A request to create a task in draft state.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub project: String,
    pub app: String,
    pub inputs: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TasksQuery<'a> {
    pub project: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub limit: usize,
    pub offset: usize,
    pub fields: &'static str,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LogFile {
    pub id: FileId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub logs: HashMap<String, Option<LogFile>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExecutionDetails {
    #[serde(default)]
    pub jobs: Vec<Job>,
}
