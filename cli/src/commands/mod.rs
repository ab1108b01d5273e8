use log::info;
use std::fmt::Display;

pub mod config;
pub mod copy;
pub mod create;
pub mod delete;
pub mod export;
pub mod find;
pub mod get;
pub mod report;
pub mod run;
pub mod update;

/// Whether a mutating command should go ahead. Without `--run`, logs what would have been
/// done instead.
pub fn should_run(run: bool, action: impl Display) -> bool {
    if !run {
        info!("DRY RUN: would {}. Pass --run to apply.", action);
    }
    run
}

/// Web page of a task or file, as linked from the platform's UI.
pub fn resource_url(web_base: &str, project: &str, kind: &str, id: &str) -> String {
    format!("{}/{}/{}/{}", web_base.trim_end_matches('/'), project, kind, id)
}

pub const DEFAULT_WEB_BASE: &str = "https://cavatica.sbgenomics.com/u/";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resource_url() {
        assert_eq!(
            resource_url(DEFAULT_WEB_BASE, "alice/test", "tasks", "t1"),
            "https://cavatica.sbgenomics.com/u/alice/test/tasks/t1"
        );
        assert_eq!(
            resource_url("https://example.org/u", "alice/test", "files", "f1"),
            "https://example.org/u/alice/test/files/f1"
        );
    }

    #[test]
    fn test_should_run() {
        assert!(should_run(true, "delete 3 files"));
        assert!(!should_run(false, "delete 3 files"));
    }
}
