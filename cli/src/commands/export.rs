use anyhow::{Context, Result};
use log::{info, warn};
use sbg_client::{submit_and_wait_observed, BulkExport, BulkOptions, Client, File, FileId};
use std::{path::PathBuf, sync::Arc, time::Duration};
use structopt::StructOpt;

use crate::{
    commands::should_run,
    errors::ValidationError,
    progress::{bulk_progress, BulkStatistics},
    utils::{
        lookup::{
            completed_task_outputs, get_files, manifest_files, split_exportable,
            with_secondary_files, TaskSelection,
        },
        read_lines,
    },
};

#[derive(Debug, StructOpt)]
pub enum ExportArgs {
    #[structopt(name = "files")]
    /// Export files, with their secondary files, to a volume
    Files(ExportFilesArgs),

    #[structopt(name = "task-outputs")]
    /// Export the output files of completed tasks to a volume
    TaskOutputs(ExportTaskOutputsArgs),
}

#[derive(Debug, StructOpt)]
pub struct ExportFilesArgs {
    #[structopt(long = "ids-file", parse(from_os_str))]
    /// File with one file id per line
    ids_file: Option<PathBuf>,

    #[structopt(long = "manifest", parse(from_os_str))]
    /// CSV manifest with an `id` column, or `name` and `project` columns
    manifest: Option<PathBuf>,

    #[structopt(flatten)]
    destination: Destination,

    #[structopt(long = "no-overwrite")]
    /// Fail the export of files which already exist on the volume
    no_overwrite: bool,

    #[structopt(long = "copy-only")]
    /// Keep the files on the platform
    copy_only: bool,

    #[structopt(long = "run")]
    /// Actually start the exports
    run: bool,
}

#[derive(Debug, StructOpt)]
pub struct ExportTaskOutputsArgs {
    #[structopt(flatten)]
    selection: TaskSelection,

    #[structopt(flatten)]
    destination: Destination,

    #[structopt(long = "run")]
    /// Actually start the exports
    run: bool,
}

#[derive(Debug, StructOpt)]
struct Destination {
    #[structopt(long = "volume")]
    /// Volume to export to, as <owner>/<volume>
    volume: String,

    #[structopt(long = "location", default_value = "harmonized")]
    /// Folder on the volume
    location: String,

    #[structopt(long = "poll-interval", default_value = "10")]
    /// Seconds between two status checks of running exports
    poll_interval: u64,
}

impl Destination {
    fn bulk_options(&self) -> BulkOptions {
        BulkOptions {
            poll_interval: Duration::from_secs(self.poll_interval),
            ..Default::default()
        }
    }
}

pub fn run(export_args: &ExportArgs, client: &Client, page_size: usize) -> Result<()> {
    match export_args {
        ExportArgs::Files(args) => {
            let files = match (&args.ids_file, &args.manifest) {
                (Some(ids_file), None) => {
                    let ids: Vec<FileId> = read_lines(ids_file)?;
                    get_files(client, &ids)?
                }
                (None, Some(manifest)) => manifest_files(client, manifest, page_size)?,
                _ => {
                    return Err(ValidationError::Arguments(
                        "Pass exactly one of --ids-file or --manifest",
                    )
                    .into())
                }
            };
            let operation = BulkExport {
                client,
                volume: args.destination.volume.clone(),
                location: args.destination.location.clone(),
                overwrite: !args.no_overwrite,
                copy_only: args.copy_only,
            };
            export_files(
                client,
                &operation,
                files,
                &args.destination.bulk_options(),
                args.run,
            )
        }
        ExportArgs::TaskOutputs(args) => {
            let tasks = args.selection.fetch(client)?;
            let files = get_files(client, &completed_task_outputs(&tasks))?;
            let operation = BulkExport {
                client,
                volume: args.destination.volume.clone(),
                location: args.destination.location.clone(),
                overwrite: true,
                copy_only: false,
            };
            export_files(
                client,
                &operation,
                files,
                &args.destination.bulk_options(),
                args.run,
            )
        }
    }
}

fn export_files(
    client: &Client,
    operation: &BulkExport,
    files: Vec<File>,
    options: &BulkOptions,
    run: bool,
) -> Result<()> {
    let files = with_secondary_files(client, files)?;
    let (exportable, rejected) = split_exportable(files);
    for reason in &rejected {
        warn!("Cannot export {}, skipping", reason);
    }
    if exportable.is_empty() {
        info!("No files to export.");
        return Ok(());
    }

    let target = format!("{}/{}", operation.volume, operation.location);
    for file in &exportable {
        info!("To export: `{}` ({})", file.name, file.id);
    }
    if !should_run(
        run,
        format!("export {} files to `{}`", exportable.len(), target),
    ) {
        return Ok(());
    }

    let statistics = Arc::new(BulkStatistics::default());
    let mut progress = bulk_progress("Exported", exportable.len(), &statistics);
    let exports = submit_and_wait_observed(
        operation,
        &exportable,
        options,
        |done| statistics.set_done(done),
    )
    .context("Operation to export files has failed.");
    progress.done();

    info!("Exported {} files to `{}`.", exports?.len(), target);
    Ok(())
}
