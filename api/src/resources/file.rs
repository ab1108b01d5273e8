use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub String);

impl FromStr for Id {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        let string = string.trim();
        if string.is_empty() {
            Err(Error::BadResourceId { kind: "file" })
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

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    File,
    Folder,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    #[default]
    Platform,
    Volume,
    #[serde(other)]
    Other,
}

impl fmt::Display for StorageType {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(match self {
            StorageType::Platform => "PLATFORM",
            StorageType::Volume => "VOLUME",
            StorageType::Other => "OTHER",
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Storage {
    #[serde(rename = "type", default)]
    pub kind: StorageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Id and name of a file referenced by another resource, such as a secondary file or a task
/// output.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FileRef {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct File {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub parent: Option<Id>,
    #[serde(rename = "type", default)]
    pub kind: Kind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub storage: Option<Storage>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(rename = "_secondary_files", alias = "secondary_files", default)]
    pub secondary_files: Vec<FileRef>,
}

impl File {
    pub fn is_folder(&self) -> bool {
        self.kind == Kind::Folder
    }

    /// Files without storage information are stored on the platform.
    pub fn storage_type(&self) -> StorageType {
        self.storage
            .as_ref()
            .map(|storage| storage.kind.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct FilesQuery<'a> {
    pub project: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub limit: usize,
    pub offset: usize,
    pub fields: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RenameRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CopyRequest<'a> {
    pub file_ids: &'a [Id],
    pub project: &'a str,
}

/// Result of copying one file, keyed by the source file id in the response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CopiedFile {
    #[serde(rename = "new_file_id", default)]
    pub new_id: Option<Id>,
    #[serde(rename = "new_file_name", default)]
    pub new_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BulkDeleteRequest<'a> {
    pub file_ids: &'a [Id],
}
