use anyhow::{Context, Result};
use chrono::Local;
use log::{error, info};
use sbg_client::{Client, ProjectId, Task};
use std::path::PathBuf;
use structopt::StructOpt;

use crate::{
    commands::should_run,
    errors::ValidationError,
    printer::Printer,
    utils::{
        options_file::{parse_assignments, TaskPlan},
        tables::{Delimiter, Table},
        workflow::read_workflow,
        write_lines,
    },
};

#[derive(Debug, StructOpt)]
pub struct CreateTasksArgs {
    #[structopt(long = "project")]
    /// Project to create the tasks in, as <owner>/<project>
    project: ProjectId,

    #[structopt(long = "app")]
    /// App to run, as <owner>/<project>/<app>
    app: String,

    #[structopt(long = "workflow", parse(from_os_str))]
    /// CWL workflow of the app, used to type the options
    workflow: PathBuf,

    #[structopt(long = "options-file", parse(from_os_str))]
    /// TSV with one column per workflow input and one row per task
    options_file: PathBuf,

    #[structopt(long = "set", number_of_values = 1)]
    /// Default value of an input for every task, as name=value (can be repeated)
    set: Vec<String>,

    #[structopt(long = "out", parse(from_os_str), default_value = "new_task_ids.txt")]
    /// Where to write the ids of the created tasks, one per line
    out: PathBuf,

    #[structopt(long = "skip-name-check")]
    /// Allow an app whose name differs from the workflow file name
    skip_name_check: bool,

    #[structopt(long = "run")]
    /// Actually create the tasks
    run: bool,
}

/// The last segment of the app id must be the workflow's file stem.
pub fn check_app_name(app: &str, workflow: &str) -> Result<(), ValidationError> {
    let app_name = app.trim_end_matches('/').rsplit('/').next().unwrap_or(app);
    if app_name == workflow {
        Ok(())
    } else {
        Err(ValidationError::AppNameMismatch {
            app: app.to_owned(),
            workflow: workflow.to_owned(),
        })
    }
}

pub fn create(
    client: &Client,
    args: &CreateTasksArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let inputs = read_workflow(&args.workflow)?;
    if !args.skip_name_check {
        check_app_name(&args.app, inputs.name())?;
    }
    let defaults = parse_assignments(&args.set, &inputs)?;
    let options = Table::read(&args.options_file, Delimiter::Tab)?;

    let plan = TaskPlan {
        project: &args.project,
        app: &args.app,
        inputs: &inputs,
        defaults: &defaults,
        date: Local::now().date_naive(),
        page_size,
    };
    let new_tasks = plan.tasks(client, &options)?;
    for task in &new_tasks {
        info!("Task `{}` with {} inputs", task.name, task.inputs.len());
    }

    if !should_run(
        args.run,
        format!("create {} tasks in `{}`", new_tasks.len(), args.project),
    ) {
        return Ok(());
    }

    let mut created: Vec<Task> = Vec::with_capacity(new_tasks.len());
    for new_task in &new_tasks {
        match client.create_task(new_task) {
            Ok(task) => {
                info!("Created task `{}` ({})", task.name, task.id);
                created.push(task);
            }
            Err(create_error) => {
                // Keep the ids of the tasks which were created before giving up.
                if let Err(write_error) = write_lines(&args.out, created.iter().map(|task| &task.id))
                {
                    error!("{:#}", write_error);
                }
                return Err(create_error)
                    .with_context(|| format!("Could not create task `{}`", new_task.name));
            }
        }
    }

    write_lines(&args.out, created.iter().map(|task| &task.id))?;
    info!(
        "Wrote {} task ids to `{}`",
        created.len(),
        args.out.display()
    );
    printer.print_resources(&created)
}
