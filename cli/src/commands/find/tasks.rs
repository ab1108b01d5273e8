use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use prettytable::{cell, row, Row};
use sbg_client::{Client, ExecutionDetails, FileId, ProjectId, Task, TaskId, TaskStatus};
use serde::Serialize;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

use crate::{
    commands::{resource_url, DEFAULT_WEB_BASE},
    errors::ValidationError,
    printer::{DisplayTable, Printer},
    utils::{
        lookup::{project_tasks, skip_missing, StatusFilter},
        read_lines,
    },
};

#[derive(Debug, StructOpt)]
pub struct FindTasksArgs {
    #[structopt(long = "project")]
    /// Project to list, as <owner>/<project>
    project: ProjectId,

    #[structopt(long = "status")]
    /// Only list tasks with one of these comma separated statuses, e.g. FAILED,ABORTED
    status: Option<StatusFilter>,
}

#[derive(Debug, StructOpt)]
pub struct FindLogsArgs {
    #[structopt(long = "project")]
    /// Find the logs of every completed task of this project
    project: Option<ProjectId>,

    #[structopt(long = "task-file", parse(from_os_str))]
    /// File with one task id per line
    task_file: Option<PathBuf>,

    #[structopt(short = "f", long = "file", parse(from_os_str))]
    /// Also write the logs found to this TSV file
    output: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
pub struct FindUrlArgs {
    #[structopt(name = "id")]
    /// Id of a task or a file
    id: String,

    #[structopt(long = "web-base", default_value = DEFAULT_WEB_BASE)]
    /// Base of the platform's web pages
    web_base: String,
}

pub fn find_tasks(
    client: &Client,
    args: &FindTasksArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let tasks = project_tasks(client, &args.project, args.status.as_ref(), page_size)?;
    info!("Found {} tasks in `{}`", tasks.len(), args.project);
    printer.print_resources(&tasks)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRow {
    pub task_name: String,
    pub job_name: String,
    pub log_name: String,
    pub log_id: FileId,
}

impl DisplayTable for LogRow {
    fn to_table_headers() -> Row {
        row![bFg => "Task", "Job", "Log", "Log ID"]
    }

    fn to_table_row(&self) -> Row {
        row![self.task_name, self.job_name, self.log_name, self.log_id.0]
    }
}

/// One row per log file of every job, sorted by job and then by log.
pub fn log_rows(task: &Task, details: &ExecutionDetails) -> Vec<LogRow> {
    let mut rows = Vec::new();
    for job in &details.jobs {
        let mut logs = job
            .logs
            .iter()
            .filter_map(|(key, log)| log.as_ref().map(|log| (key, log)))
            .collect::<Vec<_>>();
        logs.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));

        rows.extend(logs.into_iter().map(|(key, log)| LogRow {
            task_name: task.name.clone(),
            job_name: job.name.clone(),
            log_name: log.name.clone().unwrap_or_else(|| key.clone()),
            log_id: log.id.clone(),
        }));
    }
    rows
}

fn write_log_rows(path: &Path, rows: &[LogRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Could not create `{}`", path.display()))?;
    writer.write_record(["Task_Name", "Job_Name", "Log_Name", "Log_ID"])?;
    for row in rows {
        writer.write_record([
            row.task_name.as_str(),
            row.job_name.as_str(),
            row.log_name.as_str(),
            row.log_id.0.as_str(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Could not write to `{}`", path.display()))
}

pub fn find_logs(
    client: &Client,
    args: &FindLogsArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let tasks = match (&args.project, &args.task_file) {
        (Some(project), None) => client
            .get_all_tasks(project, Some(&TaskStatus::Completed), page_size)
            .with_context(|| format!("Could not list the tasks of `{project}`"))?,
        (None, Some(task_file)) => {
            let ids: Vec<TaskId> = read_lines(task_file)?;
            let mut tasks = Vec::with_capacity(ids.len());
            for id in &ids {
                tasks.extend(skip_missing(client.get_task(id), || format!("Task `{id}`"))?);
            }
            tasks
        }
        _ => {
            return Err(
                ValidationError::Arguments("Pass exactly one of --project or --task-file").into(),
            )
        }
    };

    let mut rows = Vec::new();
    for task in &tasks {
        if task.status != TaskStatus::Completed {
            debug!("Task `{}` is {}, skipping", task.id, task.status);
            continue;
        }
        let details = client
            .get_execution_details(&task.id)
            .with_context(|| format!("Could not get execution details of task `{}`", task.id))?;
        rows.extend(log_rows(task, &details));
    }
    info!("Found {} logs in {} tasks", rows.len(), tasks.len());

    if let Some(output) = &args.output {
        write_log_rows(output, &rows)?;
        info!("Wrote logs to `{}`", output.display());
    }
    printer.print_resources(&rows)
}

/// Print the web page of a task, or of a file if no task has this id.
pub fn find_url(client: &Client, args: &FindUrlArgs) -> Result<()> {
    let task = skip_missing(client.get_task(&TaskId(args.id.clone())), || {
        format!("Task `{}`", args.id)
    })?;
    let (project, kind) = match task {
        Some(task) => (task.project, "tasks"),
        None => {
            let file = client
                .get_file(&FileId(args.id.clone()))
                .map_err(|error| {
                    if error.is_not_found() {
                        anyhow!("`{}` is neither an existing task nor a file", args.id)
                    } else {
                        error.into()
                    }
                })?;
            (file.project, "files")
        }
    };

    let project = project.ok_or_else(|| anyhow!("`{}` does not belong to a project", args.id))?;
    println!("{}", resource_url(&args.web_base, &project, kind, &args.id));
    Ok(())
}
