use std::path::PathBuf;

/// Problems with the profile store or the connection settings derived from it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown profile `{profile}` (profiles are read from `{}`)", path.display())]
    UnknownProfile { profile: String, path: PathBuf },

    #[error("Profile `{profile}` has no API token, set one with `cav config add` or pass `--token`")]
    MissingToken { profile: String },
}

/// Bad local input, detected before anything is sent to the platform.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Column `{column}` is not an input of workflow `{workflow}`")]
    UnknownInput { column: String, workflow: String },

    #[error("Value `{value}` of input `{input}` is not a valid {kind}")]
    BadValue {
        input: String,
        value: String,
        kind: &'static str,
    },

    #[error("`{}` is missing required column(s): {}", path.display(), columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("Conflicting values for `{field}` of `{key}` in `{}`", path.display())]
    ConflictingValues {
        path: PathBuf,
        key: String,
        field: String,
    },

    #[error("Expected `name=value`, got `{assignment}`")]
    BadAssignment { assignment: String },

    #[error("App `{app}` does not match workflow file `{workflow}`, pass --skip-name-check to ignore")]
    AppNameMismatch { app: String, workflow: String },

    #[error("Unknown field `{field}` in issue form")]
    UnknownIssueField { field: String },

    #[error("Missing field `{field}` in issue form")]
    MissingIssueField { field: String },

    #[error("{0}")]
    Arguments(&'static str),
}
