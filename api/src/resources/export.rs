use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    bulk::{BulkItemError, BulkJob, JobState},
    resources::file::{File, Id as FileId, StorageType},
};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Id(pub String);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Source {
    pub file: FileId,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Destination {
    pub volume: String,
    pub location: String,
}

/// A request to export one platform file to a volume.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewExport {
    pub source: Source,
    pub destination: Destination,
    pub overwrite: bool,
}

impl NewExport {
    /// Export `file` to `<location>/<file name>` on `volume`.
    pub fn new(file: &File, volume: &str, location: &str, overwrite: bool) -> Self {
        let location = location.trim_matches('/');
        let location = if location.is_empty() {
            file.name.clone()
        } else {
            format!("{}/{}", location, file.name)
        };
        Self {
            source: Source {
                file: file.id.clone(),
            },
            destination: Destination {
                volume: volume.to_owned(),
                location,
            },
            overwrite,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Export {
    pub id: Id,
    pub state: JobState,
    pub source: Source,
    pub destination: Destination,
    #[serde(default)]
    pub error: Option<BulkItemError>,
    #[serde(default)]
    pub started_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_on: Option<DateTime<Utc>>,
}

impl BulkJob for Export {
    fn state(&self) -> JobState {
        self.state
    }

    fn failure_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CopyOnlyQuery {
    pub copy_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GetExportsRequest<'a> {
    pub export_ids: Vec<&'a str>,
}

/// Why a file cannot be exported to a volume.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotExportable {
    #[error("`{}` carries the platform duplicate-name prefix `_<n>_`", name)]
    DuplicateName { name: String },

    #[error("`{}` is stored on {} storage, not on the platform", name, storage)]
    NotOnPlatform { name: String, storage: StorageType },
}

// The platform prefixes `_<n>_` to the name of a file when one with the same name exists.
static DUPLICATE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_\d+_").expect("Duplicate name pattern is well-formed"));

pub fn check_exportable(file: &File) -> std::result::Result<(), NotExportable> {
    if DUPLICATE_NAME.is_match(&file.name) {
        return Err(NotExportable::DuplicateName {
            name: file.name.clone(),
        });
    }
    match file.storage_type() {
        StorageType::Platform => Ok(()),
        storage => Err(NotExportable::NotOnPlatform {
            name: file.name.clone(),
            storage,
        }),
    }
}
