use anyhow::{Context, Result};
use log::{info, warn};
use prettytable::{cell, row, Row};
use sbg_client::{list_project_files, resolve_file, Client, File, FileId, ProjectId};
use serde::Serialize;
use serde_json::Value;
use std::{collections::HashMap, path::PathBuf};
use structopt::StructOpt;

use crate::{
    errors::ValidationError,
    printer::{DisplayTable, Printer},
    utils::{
        lookup::{manifest_files, split_exportable},
        read_lines,
        tables::{Delimiter, Table},
    },
};

#[derive(Debug, StructOpt)]
pub struct FindFileArgs {
    #[structopt(long = "project")]
    /// Project to search, as <owner>/<project>
    project: ProjectId,

    #[structopt(name = "name")]
    /// Exact name of the file
    name: String,
}

#[derive(Debug, StructOpt)]
pub struct FindFilesByMetadataArgs {
    #[structopt(long = "project")]
    /// Project to search, as <owner>/<project>
    project: ProjectId,

    #[structopt(long = "key")]
    /// Metadata key to match, also the name of the column holding the values to look up
    key: String,

    #[structopt(long = "input", parse(from_os_str))]
    /// TSV file with a column named after the metadata key
    input: PathBuf,

    #[structopt(long = "recursive")]
    /// Search folders too, rather than only the root of the project
    recursive: bool,
}

#[derive(Debug, StructOpt)]
pub struct FindExportableArgs {
    #[structopt(long = "project")]
    /// Check every file of this project
    project: Option<ProjectId>,

    #[structopt(long = "manifest", parse(from_os_str))]
    /// Check the files of a CSV manifest with an `id` column, or `name` and `project` columns
    manifest: Option<PathBuf>,

    #[structopt(long = "recursive")]
    /// With --project, search folders too
    recursive: bool,
}

#[derive(Debug, StructOpt)]
pub struct FindProjectOfFileArgs {
    #[structopt(long = "names-file", parse(from_os_str))]
    /// File with one file name per line
    names_file: PathBuf,

    #[structopt(long = "skip-owner")]
    /// Do not search projects of this owner (can be repeated)
    skip_owners: Vec<String>,
}

pub fn find_file(
    client: &Client,
    args: &FindFileArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let file = resolve_file(client, &args.project, &args.name, page_size)
        .with_context(|| format!("Could not find `{}` in `{}`", args.name, args.project))?;
    printer.print_resources(&[file])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataMatch {
    pub value: String,
    pub name: String,
    pub id: FileId,
}

impl DisplayTable for MetadataMatch {
    fn to_table_headers() -> Row {
        row![bFg => "Value", "Name", "ID"]
    }

    fn to_table_row(&self) -> Row {
        row![self.value, self.name, self.id.0]
    }
}

fn metadata_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// The files whose `key` metadata equals one of `values`, grouped by value in the order given.
pub fn match_metadata(files: &[File], key: &str, values: &[&str]) -> Vec<MetadataMatch> {
    let mut by_value: HashMap<String, Vec<&File>> = HashMap::new();
    for file in files {
        if let Some(value) = file.metadata.get(key).and_then(metadata_text) {
            by_value.entry(value).or_default().push(file);
        }
    }

    values
        .iter()
        .flat_map(|value| {
            by_value
                .get(*value)
                .into_iter()
                .flatten()
                .map(move |file| MetadataMatch {
                    value: (*value).to_owned(),
                    name: file.name.clone(),
                    id: file.id.clone(),
                })
        })
        .collect()
}

pub fn find_by_metadata(
    client: &Client,
    args: &FindFilesByMetadataArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let input = Table::read(&args.input, Delimiter::Tab)?;
    input.require(&[args.key.as_str()])?;
    let values = input
        .rows()
        .map(|row| row.get(&args.key))
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>();

    let files = list_project_files(client, &args.project, args.recursive, page_size)
        .with_context(|| format!("Could not list the files of `{}`", args.project))?;
    info!("Searching {} files for {} values", files.len(), values.len());

    let matches = match_metadata(&files, &args.key, &values);
    if matches.is_empty() {
        warn!("No file has a matching `{}`", args.key);
    }
    printer.print_resources(&matches)
}

pub fn find_exportable(
    client: &Client,
    args: &FindExportableArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let files = match (&args.project, &args.manifest) {
        (Some(project), None) => list_project_files(client, project, args.recursive, page_size)
            .with_context(|| format!("Could not list the files of `{project}`"))?,
        (None, Some(manifest)) => manifest_files(client, manifest, page_size)?,
        _ => {
            return Err(
                ValidationError::Arguments("Pass exactly one of --project or --manifest").into(),
            )
        }
    };

    let total = files.len();
    let (exportable, rejected) = split_exportable(files);
    for reason in &rejected {
        warn!("Cannot export {}", reason);
    }
    info!("{} of {} files can be exported", exportable.len(), total);
    printer.print_resources(&exportable)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLocation {
    pub name: String,
    pub project: ProjectId,
    pub id: FileId,
}

impl DisplayTable for FileLocation {
    fn to_table_headers() -> Row {
        row![bFg => "Name", "Project", "ID"]
    }

    fn to_table_row(&self) -> Row {
        row![self.name, self.project.0, self.id.0]
    }
}

pub fn find_project_of_file(
    client: &Client,
    args: &FindProjectOfFileArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let names: Vec<String> = read_lines(&args.names_file)?;
    let projects = client
        .get_all_projects(page_size)
        .context("Operation to list projects has failed.")?
        .into_iter()
        .filter(|project| {
            !args
                .skip_owners
                .iter()
                .any(|owner| owner == project.id.owner())
        })
        .collect::<Vec<_>>();
    info!("Searching {} projects", projects.len());

    let mut locations = Vec::with_capacity(names.len());
    for name in &names {
        let mut found = None;
        for project in &projects {
            match resolve_file(client, &project.id, name, page_size) {
                Ok(file) => {
                    found = Some(FileLocation {
                        name: name.clone(),
                        project: project.id.clone(),
                        id: file.id,
                    });
                    break;
                }
                Err(error) if error.is_not_found() => continue,
                Err(error) => {
                    return Err(error)
                        .with_context(|| format!("Could not search `{}`", project.id))
                }
            }
        }
        match found {
            Some(location) => locations.push(location),
            None => warn!("File `{}` is not in any project, skipping", name),
        }
    }
    printer.print_resources(&locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn file(id: &str, name: &str, metadata: Value) -> File {
        File {
            id: FileId(id.to_owned()),
            name: name.to_owned(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_match_metadata_groups_by_requested_value() {
        let files = vec![
            file("f1", "a.bam", json!({"sample_id": "S1"})),
            file("f2", "b.bam", json!({"sample_id": "S2"})),
            file("f3", "c.bam", json!({"sample_id": "S1"})),
            file("f4", "d.bam", json!({})),
            file("f5", "e.bam", json!({"sample_id": 7})),
        ];

        let matches = match_metadata(&files, "sample_id", &["S1", "S3", "7"]);
        assert_eq!(
            matches
                .iter()
                .map(|found| (found.value.as_str(), found.name.as_str()))
                .collect::<Vec<_>>(),
            vec![("S1", "a.bam"), ("S1", "c.bam"), ("7", "e.bam")]
        );
    }
}
