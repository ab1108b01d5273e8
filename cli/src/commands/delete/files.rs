use anyhow::{anyhow, Context, Result};
use log::info;
use sbg_client::{
    submit_and_wait_observed, BulkDelete, BulkOptions, Client, FileId, ProjectId, Task,
    TaskStatus,
};
use std::{collections::HashSet, path::Path, sync::Arc};

use crate::{
    commands::should_run,
    progress::{bulk_progress, BulkStatistics},
    utils::{
        confirm,
        lookup::{project_tasks, resolve_names, StatusFilter},
        read_lines,
    },
};

pub fn delete_by_id(client: &Client, ids_file: &Path, yes: bool, run: bool) -> Result<()> {
    let ids: Vec<FileId> = read_lines(ids_file)?;
    delete_files(client, dedup(ids), yes, run)
}

pub fn delete_by_name(
    client: &Client,
    project: &ProjectId,
    names_file: &Path,
    yes: bool,
    run: bool,
    page_size: usize,
) -> Result<()> {
    let names: Vec<String> = read_lines(names_file)?;
    let files = resolve_names(client, project, &names, page_size)?;
    for file in &files {
        info!("Found `{}` ({})", file.name, file.id);
    }
    delete_files(
        client,
        dedup(files.into_iter().map(|file| file.id).collect()),
        yes,
        run,
    )
}

pub fn delete_failed_outputs(
    client: &Client,
    project: &ProjectId,
    include_aborted: bool,
    yes: bool,
    run: bool,
    page_size: usize,
) -> Result<()> {
    let mut statuses = vec![TaskStatus::Failed];
    if include_aborted {
        statuses.push(TaskStatus::Aborted);
    }
    let tasks = project_tasks(client, project, Some(&StatusFilter(statuses)), page_size)?;
    for task in &tasks {
        info!(
            "Task `{}` ({}) is {} with {} output files",
            task.name,
            task.id,
            task.status,
            task.output_files().len()
        );
    }
    delete_files(client, task_outputs(&tasks), yes, run)
}

/// Every output file of `tasks`, including secondary files, each once.
fn task_outputs(tasks: &[Task]) -> Vec<FileId> {
    dedup(
        tasks
            .iter()
            .flat_map(|task| task.output_files())
            .map(|file| file.id)
            .collect(),
    )
}

fn dedup(ids: Vec<FileId>) -> Vec<FileId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Delete files in bulk, behind `--run` and a confirmation prompt. Files which no longer exist
/// count as deleted.
fn delete_files(client: &Client, ids: Vec<FileId>, yes: bool, run: bool) -> Result<()> {
    if ids.is_empty() {
        info!("No files to delete.");
        return Ok(());
    }
    if !should_run(run, format!("delete {} files", ids.len())) {
        return Ok(());
    }
    if !yes && !confirm(&format!("Delete {} files? This cannot be undone.", ids.len()))? {
        return Err(anyhow!("Deletion aborted by user"));
    }

    let statistics = Arc::new(BulkStatistics::default());
    let mut progress = bulk_progress("Deleted", ids.len(), &statistics);
    let deletions = submit_and_wait_observed(
        &BulkDelete { client },
        &ids,
        &BulkOptions::default(),
        |done| statistics.set_done(done),
    )
    .context("Operation to delete files has failed.");
    progress.done();

    let deletions = deletions?;
    let already_deleted = deletions
        .iter()
        .filter(|deletion| deletion.already_deleted)
        .count();
    info!(
        "Deleted {} files ({} were already deleted).",
        deletions.len(),
        already_deleted
    );
    Ok(())
}
