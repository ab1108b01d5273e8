use anyhow::{Context, Result};
use log::{debug, info, warn};
use sbg_client::{resolve_file, Client, ProjectId};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, path::PathBuf};
use structopt::StructOpt;

use crate::{
    commands::should_run,
    errors::ValidationError,
    utils::{
        lookup::skip_missing,
        tables::{Delimiter, Table},
    },
};

const BIOASSAY_ID: &str = "Bioassay_ID";
const FILE_NAME: &str = "file_name";

/// Manifest columns copied into the metadata of every file of a Bioassay ID.
const METADATA_FIELDS: [&str; 5] = [
    "external_sample_id",
    "sample_type",
    "composition",
    "experimental_strategy",
    BIOASSAY_ID,
];

#[derive(Debug, StructOpt)]
pub struct UpdateMetadataArgs {
    #[structopt(long = "project")]
    /// Project holding the files, as <owner>/<project>
    project: ProjectId,

    #[structopt(long = "manifest", parse(from_os_str))]
    /// TSV manifest with the sample metadata of each Bioassay ID
    manifest: PathBuf,

    #[structopt(long = "sample-dict", parse(from_os_str))]
    /// TSV file with `file_name` and `Bioassay_ID` columns
    sample_dict: PathBuf,

    #[structopt(long = "run")]
    /// Actually update the metadata
    run: bool,
}

/// Metadata of each Bioassay ID in the manifest. Rows repeating an id must agree on every field.
pub fn build_metadata(manifest: &Table) -> Result<BTreeMap<String, Map<String, Value>>> {
    manifest.require(&METADATA_FIELDS)?;
    let mut by_bioassay: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for row in manifest.rows() {
        let bioassay_id = row.get(BIOASSAY_ID);
        let metadata = by_bioassay.entry(bioassay_id.to_owned()).or_default();
        for field in METADATA_FIELDS {
            let value = Value::String(row.get(field).to_owned());
            match metadata.get(field) {
                Some(existing) if *existing != value => {
                    return Err(ValidationError::ConflictingValues {
                        path: manifest.path().to_owned(),
                        key: bioassay_id.to_owned(),
                        field: field.to_owned(),
                    }
                    .into())
                }
                Some(_) => {}
                None => {
                    metadata.insert(field.to_owned(), value);
                }
            }
        }
    }
    Ok(by_bioassay)
}

/// File names paired with their Bioassay ID, in the order of the sample dictionary.
fn read_sample_dict(sample_dict: &Table) -> Result<Vec<(String, String)>> {
    sample_dict.require(&[FILE_NAME, BIOASSAY_ID])?;
    Ok(sample_dict
        .rows()
        .map(|row| (row.get(FILE_NAME).to_owned(), row.get(BIOASSAY_ID).to_owned()))
        .collect())
}

pub fn update(client: &Client, args: &UpdateMetadataArgs, page_size: usize) -> Result<()> {
    let metadata = build_metadata(&Table::read(&args.manifest, Delimiter::Tab)?)?;
    debug!("Read metadata of {} Bioassay IDs", metadata.len());
    let samples = read_sample_dict(&Table::read(&args.sample_dict, Delimiter::Tab)?)?;

    let mut updates = Vec::with_capacity(samples.len());
    for (file_name, bioassay_id) in &samples {
        let Some(fields) = metadata.get(bioassay_id) else {
            warn!(
                "Bioassay ID `{}` of `{}` is not in the manifest, skipping",
                bioassay_id, file_name
            );
            continue;
        };
        let found = skip_missing(
            resolve_file(client, &args.project, file_name, page_size),
            || format!("File `{}` in `{}`", file_name, args.project),
        )?;
        if let Some(file) = found {
            info!("To tag: `{}` ({}) as `{}`", file.name, file.id, bioassay_id);
            updates.push((file, fields));
        }
    }

    if !should_run(args.run, format!("update the metadata of {} files", updates.len())) {
        return Ok(());
    }
    for (file, fields) in &updates {
        client
            .update_file_metadata(&file.id, fields)
            .with_context(|| format!("Could not update the metadata of `{}`", file.name))?;
        info!("Updated the metadata of `{}`", file.name);
    }
    Ok(())
}
