use anyhow::{Context, Result};
use log::{info, warn};
use prettytable::{cell, row, Row};
use sbg_client::{Client, CopiedFile, FileId, ProjectId};
use serde::Serialize;
use std::{collections::BTreeMap, path::PathBuf};
use structopt::StructOpt;

use crate::{
    commands::should_run,
    printer::{DisplayTable, Printer},
    utils::read_lines,
};

/// Largest number of files a single copy request accepts.
const COPY_CHUNK_SIZE: usize = 100;

#[derive(Debug, StructOpt)]
pub enum CopyArgs {
    #[structopt(name = "files")]
    /// Copy files into another project
    Files {
        #[structopt(long = "ids-file", parse(from_os_str))]
        /// File with one file id per line
        ids_file: PathBuf,

        #[structopt(long = "project")]
        /// Destination project, as <owner>/<project>
        project: ProjectId,

        #[structopt(long = "run")]
        /// Actually copy the files
        run: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyResult {
    pub source: FileId,
    pub new_id: Option<FileId>,
    pub new_name: Option<String>,
    pub status: String,
}

impl DisplayTable for CopyResult {
    fn to_table_headers() -> Row {
        row![bFg => "Source", "New ID", "New Name", "Status"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.source.0,
            self.new_id.as_ref().map_or("", |id| id.0.as_str()),
            self.new_name.as_deref().unwrap_or(""),
            self.status
        ]
    }
}

pub fn run(copy_args: &CopyArgs, client: &Client, printer: &Printer) -> Result<()> {
    let CopyArgs::Files {
        ids_file,
        project,
        run,
    } = copy_args;

    let ids: Vec<FileId> = read_lines(ids_file)?;
    if ids.is_empty() {
        info!("No files to copy.");
        return Ok(());
    }
    if !should_run(*run, format!("copy {} files to `{}`", ids.len(), project)) {
        return Ok(());
    }

    let mut results = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(COPY_CHUNK_SIZE) {
        let copied = client
            .copy_files(chunk, project)
            .with_context(|| format!("Operation to copy files to `{project}` has failed."))?;
        results.extend(copy_results(chunk, copied));
    }

    let failed = results
        .iter()
        .filter(|result| result.new_id.is_none())
        .count();
    if failed > 0 {
        warn!("{} of {} files were not copied", failed, results.len());
    }
    info!("Copied {} files to `{}`", results.len() - failed, project);
    printer.print_resources(&results)
}

/// One result per requested file, in the order requested.
fn copy_results(requested: &[FileId], mut copied: BTreeMap<String, CopiedFile>) -> Vec<CopyResult> {
    requested
        .iter()
        .map(|source| match copied.remove(&source.0) {
            Some(copy) => CopyResult {
                source: source.clone(),
                new_id: copy.new_id,
                new_name: copy.new_name,
                status: copy.status.unwrap_or_default(),
            },
            None => CopyResult {
                source: source.clone(),
                new_id: None,
                new_name: None,
                status: "MISSING".to_owned(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_copy_results_follow_request_order() {
        let copied: BTreeMap<String, CopiedFile> = serde_json::from_value(json!({
            "f2": {"status": "OK", "new_file_id": "n2", "new_file_name": "b.bam"},
            "f1": {"status": "OK", "new_file_id": "n1", "new_file_name": "a.bam"},
        }))
        .unwrap();
        let requested = ["f1", "f2", "f3"]
            .iter()
            .map(|id| FileId(id.to_string()))
            .collect::<Vec<_>>();

        let results = copy_results(&requested, copied);
        assert_eq!(
            results
                .iter()
                .map(|result| (
                    result.source.0.as_str(),
                    result.new_id.as_ref().map(|id| id.0.as_str()),
                    result.status.as_str()
                ))
                .collect::<Vec<_>>(),
            vec![
                ("f1", Some("n1"), "OK"),
                ("f2", Some("n2"), "OK"),
                ("f3", None, "MISSING")
            ]
        );
    }
}
