use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use sbg_client::{Client, Task, TaskId, TaskStatus};
use std::{thread, time::Duration};
use structopt::StructOpt;

use crate::{commands::should_run, printer::Printer, utils::lookup::TaskSelection};

#[derive(Debug, StructOpt)]
pub enum RunArgs {
    #[structopt(name = "tasks")]
    /// Launch draft tasks
    Tasks(RunTasksArgs),
}

#[derive(Debug, StructOpt)]
pub struct RunTasksArgs {
    #[structopt(flatten)]
    selection: TaskSelection,

    #[structopt(long = "wait")]
    /// Wait for the launched tasks to finish
    wait: bool,

    #[structopt(long = "poll-interval", default_value = "60")]
    /// Seconds between two status checks while waiting
    poll_interval: u64,

    #[structopt(long = "max-checks")]
    /// Give up waiting after this many status checks
    max_checks: Option<usize>,

    #[structopt(long = "run")]
    /// Actually launch the tasks
    run: bool,
}

pub fn run(args: &RunArgs, client: &Client, printer: &Printer) -> Result<()> {
    match args {
        RunArgs::Tasks(args) => run_tasks(client, args, printer),
    }
}

fn run_tasks(client: &Client, args: &RunTasksArgs, printer: &Printer) -> Result<()> {
    let tasks = args.selection.fetch(client)?;
    let drafts = tasks
        .into_iter()
        .filter(|task| {
            let is_draft = task.status == TaskStatus::Draft;
            if !is_draft {
                warn!(
                    "Task `{}` ({}) is {}, only draft tasks can be launched, skipping",
                    task.name, task.id, task.status
                );
            }
            is_draft
        })
        .collect::<Vec<_>>();

    if !should_run(args.run, format!("launch {} draft tasks", drafts.len())) {
        return Ok(());
    }

    // A single task is fatal, tasks from a file are launched as far as possible.
    let keep_going = args.selection.task_file.is_some();
    let mut launched = Vec::with_capacity(drafts.len());
    let mut failed = 0;
    for task in &drafts {
        match client.run_task(&task.id) {
            Ok(task) => {
                info!("Launched task `{}` ({}), now {}", task.name, task.id, task.status);
                launched.push(task);
            }
            Err(launch_error) if keep_going => {
                error!("Could not launch task `{}`: {}", task.id, launch_error);
                failed += 1;
            }
            Err(launch_error) => {
                return Err(launch_error)
                    .with_context(|| format!("Could not launch task `{}`", task.id))
            }
        }
    }

    let tasks = if args.wait {
        let ids = launched.iter().map(|task| task.id.clone()).collect();
        wait_for_tasks(
            ids,
            |id| {
                client
                    .get_task(id)
                    .with_context(|| format!("Could not get task `{id}`"))
            },
            Duration::from_secs(args.poll_interval),
            args.max_checks,
            thread::sleep,
        )?
    } else {
        launched
    };
    printer.print_resources(&tasks)?;

    if failed > 0 {
        return Err(anyhow!("{} of {} tasks could not be launched", failed, drafts.len()));
    }
    Ok(())
}

/// Check the tasks every `poll_interval` until all of them are finished, returning their final
/// state in the order given.
pub fn wait_for_tasks(
    ids: Vec<TaskId>,
    mut get_task: impl FnMut(&TaskId) -> Result<Task>,
    poll_interval: Duration,
    max_checks: Option<usize>,
    mut sleep: impl FnMut(Duration),
) -> Result<Vec<Task>> {
    let mut finished: Vec<Option<Task>> = vec![None; ids.len()];
    let mut checks = 0;
    loop {
        for (index, id) in ids.iter().enumerate() {
            if finished[index].is_some() {
                continue;
            }
            let task = get_task(id)?;
            debug!("Task `{}` is {}", task.id, task.status);
            if task.status.is_terminal() {
                info!("Task `{}` ({}) finished as {}", task.name, task.id, task.status);
                finished[index] = Some(task);
            }
        }
        checks += 1;

        let pending = finished.iter().filter(|task| task.is_none()).count();
        if pending == 0 {
            return Ok(finished.into_iter().flatten().collect());
        }
        if max_checks.map_or(false, |max_checks| checks >= max_checks) {
            return Err(anyhow!(
                "{} tasks still running after {} status checks",
                pending,
                checks
            ));
        }
        info!("Waiting for {} tasks", pending);
        sleep(poll_interval);
    }
}
