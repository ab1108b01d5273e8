pub mod billing;
pub mod export;
pub mod file;
pub mod project;
pub mod task;
pub mod user;

use crate::{bulk::BulkItemError, error::Error};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Error payload returned by the platform on any non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub more_info: Option<String>,
}

impl ApiErrorBody {
    pub fn into_error_kind(self, status_code: StatusCode) -> Error {
        let message = match (self.message, self.more_info) {
            (Some(message), Some(more_info)) => format!("{message} ({more_info})"),
            (Some(message), None) => message,
            (None, Some(more_info)) => more_info,
            (None, None) => String::new(),
        };
        Error::Api {
            status_code,
            code: self.code,
            message,
        }
    }
}

/// The `{"items": [...]}` envelope used by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<ItemT> {
    #[serde(default = "Vec::new")]
    pub items: Vec<ItemT>,
}

/// One entry of a bulk response: either the affected resource or the reason it was rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkRecord<ResourceT> {
    #[serde(default = "Option::default")]
    pub resource: Option<ResourceT>,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

// List requests ask for complete resources, not just ids and names.
pub(crate) const ALL_FIELDS: &str = "_all";

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PageQuery {
    pub limit: usize,
    pub offset: usize,
    pub fields: &'static str,
}

impl PageQuery {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit,
            offset,
            fields: ALL_FIELDS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BulkRequest<'a, ItemT: Serialize> {
    pub items: &'a [ItemT],
}
