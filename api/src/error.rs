use reqwest::StatusCode;
use url::Url;

use crate::bulk::BulkItemError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API request failed with {}: {}", status_code, message)]
    Api {
        status_code: StatusCode,
        code: Option<i64>,
        message: String,
    },

    #[error("Invalid endpoint `{}`", endpoint)]
    BadEndpoint { endpoint: Url },

    #[error("Bad token, it cannot be sent as an HTTP header")]
    BadToken,

    #[error("Expected <owner>/<project>, got: {}", identifier)]
    BadProjectIdentifier { identifier: String },

    #[error("Expected a non-empty {} id", kind)]
    BadResourceId { kind: &'static str },

    #[error("Unknown task status: {}", status)]
    BadTaskStatus { status: String },

    #[error("Page size must be at least 1")]
    BadPageSize,

    #[error("File `{}` not found in project `{}`", name, project)]
    FileNotFound { project: String, name: String },

    #[error(
        "Found {} files named `{}` in project `{}`, refusing to pick one",
        count,
        name,
        project
    )]
    AmbiguousFile {
        project: String,
        name: String,
        count: usize,
    },

    #[error("There were errors with bulk submission:\n{}", join_lines(errors))]
    BulkSubmission { errors: Vec<BulkItemError> },

    #[error("There were errors with bulk completion:\n{}", join_lines(messages))]
    BulkCompletion { messages: Vec<String> },

    #[error("{} bulk jobs still pending after {} status checks", pending, polls)]
    BulkTimeout { pending: usize, polls: usize },

    #[error("Expected one bulk result per item, sent {} and got {}", expected, received)]
    BadBulkResponse { expected: usize, received: usize },

    #[error("Could not parse JSON response.")]
    BadJsonResponse(#[source] reqwest::Error),

    #[error("Failed to initialise the HTTP client")]
    BuildHttpClient(#[source] reqwest::Error),

    #[error("HTTP request error: {}", message)]
    ReqwestError {
        message: String,
        source: reqwest::Error,
    },
}

impl Error {
    /// Whether the resource asked for does not exist, either because the platform answered
    /// with `404 Not Found` or because no file had the name searched for.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Api { status_code, .. } => *status_code == StatusCode::NOT_FOUND,
            Error::FileNotFound { .. } => true,
            _ => false,
        }
    }
}

fn join_lines<ItemT: std::fmt::Display>(items: &[ItemT]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
