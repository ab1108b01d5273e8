use anyhow::{anyhow, Result};
use log::{error, info, warn};
use sbg_client::{Client, ProjectId, Task, TaskStatus};

use crate::{commands::should_run, utils::lookup::project_tasks};

/// Draft tasks, which are deleted, and queued or running tasks, which are aborted.
fn split_tasks(tasks: Vec<Task>) -> (Vec<Task>, Vec<Task>) {
    let mut drafts = Vec::new();
    let mut active = Vec::new();
    for task in tasks {
        match task.status {
            TaskStatus::Draft => drafts.push(task),
            TaskStatus::Queued | TaskStatus::Running => active.push(task),
            _ => {}
        }
    }
    (drafts, active)
}

pub fn delete_tasks(client: &Client, project: &ProjectId, run: bool, page_size: usize) -> Result<()> {
    let (drafts, active) = split_tasks(project_tasks(client, project, None, page_size)?);
    info!(
        "Found {} draft tasks and {} queued or running tasks in `{}`",
        drafts.len(),
        active.len(),
        project
    );
    for task in &drafts {
        info!("To delete: `{}` ({}) {}", task.name, task.id, task.status);
    }
    for task in &active {
        info!("To abort: `{}` ({}) {}", task.name, task.id, task.status);
    }

    if !should_run(
        run,
        format!(
            "delete {} tasks and abort {} tasks",
            drafts.len(),
            active.len()
        ),
    ) {
        return Ok(());
    }

    let mut failed = 0;
    for task in &drafts {
        match client.delete_task(&task.id) {
            Ok(()) => info!("Deleted draft task `{}` ({})", task.name, task.id),
            Err(delete_error) if delete_error.is_not_found() => {
                warn!("Task `{}` was already deleted, skipping", task.id)
            }
            Err(delete_error) => {
                error!("Could not delete task `{}`: {}", task.id, delete_error);
                failed += 1;
            }
        }
    }
    for task in &active {
        match client.abort_task(&task.id) {
            Ok(aborted) => info!(
                "Aborted task `{}` ({}), now {}",
                task.name, task.id, aborted.status
            ),
            Err(abort_error) => {
                error!("Could not abort task `{}`: {}", task.id, abort_error);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!(
            "{} of {} tasks could not be deleted or aborted",
            failed,
            drafts.len() + active.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sbg_client::TaskId;

    #[test]
    fn test_split_tasks_by_status() {
        let tasks = [
            ("t1", TaskStatus::Draft),
            ("t2", TaskStatus::Running),
            ("t3", TaskStatus::Completed),
            ("t4", TaskStatus::Queued),
            ("t5", TaskStatus::Failed),
        ]
        .into_iter()
        .map(|(id, status)| Task {
            id: TaskId(id.to_owned()),
            status,
            ..Default::default()
        })
        .collect();

        let (drafts, active) = split_tasks(tasks);
        let ids = |tasks: &[Task]| tasks.iter().map(|task| task.id.0.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&drafts), vec!["t1"]);
        assert_eq!(ids(&active), vec!["t2", "t4"]);
    }
}
