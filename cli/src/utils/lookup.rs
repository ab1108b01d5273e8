//! Lookups of files and tasks shared by several commands.
//!
//! Lookups of many items skip the ones that do not exist with a warning. Ambiguous names and
//! every other error abort the command.

use anyhow::{Context, Result};
use log::{debug, warn};
use sbg_client::{
    check_exportable, resolve_file, Client, File, FileId, FileStore, NotExportable, ProjectId,
    Task, TaskId, TaskStatus,
};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    str::FromStr,
};
use structopt::StructOpt;

use crate::{
    errors::ValidationError,
    utils::{
        read_lines,
        tables::{Delimiter, Table},
    },
};

/// Turn a missing resource into `None`, with a warning naming `what`.
pub fn skip_missing<T>(result: sbg_client::Result<T>, what: impl FnOnce() -> String) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_not_found() => {
            warn!("{} does not exist, skipping", what());
            Ok(None)
        }
        Err(error) => Err(error.into()),
    }
}

pub fn get_files(client: &Client, ids: &[FileId]) -> Result<Vec<File>> {
    let mut files = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(file) = skip_missing(client.get_file(id), || format!("File `{id}`"))? {
            files.push(file);
        }
    }
    Ok(files)
}

/// `files` followed by every secondary file they reference which is not already listed.
pub fn with_secondary_files(client: &Client, files: Vec<File>) -> Result<Vec<File>> {
    let mut seen: HashSet<FileId> = files.iter().map(|file| file.id.clone()).collect();
    let secondary_ids = files
        .iter()
        .flat_map(|file| file.secondary_files.iter())
        .filter(|secondary| seen.insert(secondary.id.clone()))
        .map(|secondary| secondary.id.clone())
        .collect::<Vec<_>>();
    debug!("Found {} secondary files", secondary_ids.len());

    let mut files = files;
    files.extend(get_files(client, &secondary_ids)?);
    Ok(files)
}

/// Resolve many file names in a project, skipping the ones which do not exist.
pub fn resolve_names<StoreT>(
    store: &StoreT,
    project: &ProjectId,
    names: &[String],
    page_size: usize,
) -> Result<Vec<File>>
where
    StoreT: FileStore + ?Sized,
{
    let mut files = Vec::with_capacity(names.len());
    for name in names {
        let found = skip_missing(resolve_file(store, project, name, page_size), || {
            format!("File `{name}` in `{project}`")
        })?;
        files.extend(found);
    }
    Ok(files)
}

/// Files listed in a CSV manifest, by `id` or else by `name` and `project`.
pub fn manifest_files(client: &Client, path: &Path, page_size: usize) -> Result<Vec<File>> {
    let manifest = Table::read(path, Delimiter::Comma)?;
    if manifest.has_column("id") {
        let ids = manifest
            .rows()
            .map(|row| row.get("id").parse::<FileId>())
            .collect::<sbg_client::Result<Vec<_>>>()
            .with_context(|| format!("Bad file id in `{}`", path.display()))?;
        return get_files(client, &ids);
    }

    manifest.require(&["name", "project"])?;
    let mut files = Vec::with_capacity(manifest.len());
    for row in manifest.rows() {
        let project = row
            .get("project")
            .parse::<ProjectId>()
            .with_context(|| format!("Bad project in `{}`", path.display()))?;
        files.extend(resolve_names(
            client,
            &project,
            &[row.get("name").to_owned()],
            page_size,
        )?);
    }
    Ok(files)
}

/// Tasks given either by id or by a file of task ids.
#[derive(Debug, StructOpt)]
pub struct TaskSelection {
    #[structopt(long = "task-id")]
    /// Id of a single task
    pub task_id: Option<TaskId>,

    #[structopt(long = "task-file", parse(from_os_str))]
    /// File with one task id per line
    pub task_file: Option<PathBuf>,
}

impl TaskSelection {
    /// The selected task ids, reading the task file if one was given.
    pub fn ids(&self) -> Result<Vec<TaskId>> {
        match (&self.task_id, &self.task_file) {
            (Some(task_id), None) => Ok(vec![task_id.clone()]),
            (None, Some(task_file)) => read_lines(task_file),
            (Some(_), Some(_)) => {
                Err(ValidationError::Arguments("Pass either --task-id or --task-file, not both").into())
            }
            (None, None) => Err(ValidationError::Arguments("One of --task-id or --task-file is required").into()),
        }
    }

    /// Fetch the selected tasks. A single missing task is an error, missing tasks from a file
    /// are skipped.
    pub fn fetch(&self, client: &Client) -> Result<Vec<Task>> {
        let ids = self.ids()?;
        if self.task_file.is_none() {
            return ids
                .iter()
                .map(|id| {
                    client
                        .get_task(id)
                        .with_context(|| format!("Could not get task `{id}`"))
                })
                .collect();
        }

        let mut tasks = Vec::with_capacity(ids.len());
        for id in &ids {
            tasks.extend(skip_missing(client.get_task(id), || format!("Task `{id}`"))?);
        }
        Ok(tasks)
    }
}

/// Output files of the completed tasks, deduplicated across tasks. Other tasks are skipped
/// with a warning.
pub fn completed_task_outputs(tasks: &[Task]) -> Vec<FileId> {
    let mut seen = HashSet::new();
    let mut outputs = Vec::new();
    for task in tasks {
        if task.status != TaskStatus::Completed {
            warn!("Task `{}` ({}) is {}, skipping", task.name, task.id, task.status);
            continue;
        }
        let files = task.output_files();
        debug!("Task `{}` has {} output files", task.id, files.len());
        outputs.extend(
            files
                .into_iter()
                .map(|file| file.id)
                .filter(|id| seen.insert(id.clone())),
        );
    }
    outputs
}

/// Split files into those which can be exported and the reasons the others cannot.
pub fn split_exportable(files: Vec<File>) -> (Vec<File>, Vec<NotExportable>) {
    let mut exportable = Vec::with_capacity(files.len());
    let mut rejected = Vec::new();
    for file in files {
        match check_exportable(&file) {
            Ok(()) => exportable.push(file),
            Err(reason) => rejected.push(reason),
        }
    }
    (exportable, rejected)
}

/// Comma separated task statuses, such as `FAILED,ABORTED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter(pub Vec<TaskStatus>);

impl StatusFilter {
    pub fn matches(&self, status: &TaskStatus) -> bool {
        self.0.contains(status)
    }
}

impl FromStr for StatusFilter {
    type Err = sbg_client::Error;

    fn from_str(string: &str) -> sbg_client::Result<Self> {
        string
            .split(',')
            .map(str::trim)
            .filter(|status| !status.is_empty())
            .map(str::parse::<TaskStatus>)
            .collect::<sbg_client::Result<Vec<_>>>()
            .map(Self)
    }
}

/// Tasks of `project`, only those with one of the statuses of `filter` if given.
///
/// A single status is filtered by the platform, several are filtered here.
pub fn project_tasks(
    client: &Client,
    project: &ProjectId,
    filter: Option<&StatusFilter>,
    page_size: usize,
) -> Result<Vec<Task>> {
    let server_status = match filter {
        Some(StatusFilter(statuses)) if statuses.len() == 1 => statuses.first(),
        _ => None,
    };
    let tasks = client
        .get_all_tasks(project, server_status, page_size)
        .with_context(|| format!("Could not list the tasks of `{project}`"))?;
    debug!("Fetched {} tasks from `{}`", tasks.len(), project);

    Ok(match filter {
        Some(filter) => tasks
            .into_iter()
            .filter(|task| filter.matches(&task.status))
            .collect(),
        None => tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::options_file::tests::FakeStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_names_skips_missing() {
        let store = FakeStore::with_files(&[("f1", "a.bam"), ("f2", "b.bam")]);
        let files = resolve_names(
            &store,
            &ProjectId("alice/test".to_owned()),
            &["a.bam".to_owned(), "gone.bam".to_owned(), "b.bam".to_owned()],
            50,
        )
        .unwrap();

        assert_eq!(
            files.iter().map(|file| file.id.0.as_str()).collect::<Vec<_>>(),
            vec!["f1", "f2"]
        );
    }

    #[test]
    fn test_resolve_names_fails_on_ambiguous_name() {
        let store = FakeStore::with_files(&[("f1", "a.bam"), ("f2", "a.bam")]);
        let error = resolve_names(
            &store,
            &ProjectId("alice/test".to_owned()),
            &["a.bam".to_owned()],
            50,
        )
        .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<sbg_client::Error>(),
            Some(sbg_client::Error::AmbiguousFile { count: 2, .. })
        ));
    }

    #[test]
    fn test_task_selection_requires_exactly_one_source() {
        let neither = TaskSelection {
            task_id: None,
            task_file: None,
        };
        assert!(neither.ids().is_err());

        let both = TaskSelection {
            task_id: Some(TaskId("t1".to_owned())),
            task_file: Some(PathBuf::from("tasks.txt")),
        };
        assert!(both.ids().is_err());

        let single = TaskSelection {
            task_id: Some(TaskId("t1".to_owned())),
            task_file: None,
        };
        assert_eq!(single.ids().unwrap(), vec![TaskId("t1".to_owned())]);
    }

    #[test]
    fn test_completed_task_outputs() {
        let file = |id: &str| serde_json::json!({"class": "File", "path": id, "name": id});
        let task = |id: &str, status: TaskStatus, outputs: serde_json::Value| Task {
            id: TaskId(id.to_owned()),
            status,
            outputs: outputs.as_object().cloned().unwrap(),
            ..Default::default()
        };
        let tasks = vec![
            task(
                "t1",
                TaskStatus::Completed,
                serde_json::json!({"bam": file("f1"), "logs": [[file("f2")], null]}),
            ),
            task("t2", TaskStatus::Failed, serde_json::json!({"bam": file("f9")})),
            task(
                "t3",
                TaskStatus::Completed,
                serde_json::json!({"bam": file("f3"), "shared": file("f1")}),
            ),
        ];

        assert_eq!(
            completed_task_outputs(&tasks),
            ["f1", "f2", "f3"]
                .iter()
                .map(|id| FileId(id.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_status_filter_from_str() {
        let filter: StatusFilter = "failed, ABORTED,".parse().unwrap();
        assert_eq!(filter.0, vec![TaskStatus::Failed, TaskStatus::Aborted]);
        assert!(filter.matches(&TaskStatus::Aborted));
        assert!(!filter.matches(&TaskStatus::Completed));
        assert!("FAILED,DONE".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_split_exportable() {
        let file = |id: &str, name: &str| File {
            id: FileId(id.to_owned()),
            name: name.to_owned(),
            ..Default::default()
        };
        let mut on_volume = file("f3", "chr_13.bed");
        on_volume.storage = serde_json::from_value(serde_json::json!({"type": "VOLUME"})).unwrap();
        assert_eq!(on_volume.storage_type(), sbg_client::StorageType::Volume);

        let (exportable, rejected) = split_exportable(vec![
            file("f1", "_23_output_file.txt"),
            file("f2", "__23_output.txt"),
            on_volume,
            file("f4", "chr_13.bed"),
        ]);

        assert_eq!(
            exportable
                .iter()
                .map(|file| file.id.0.as_str())
                .collect::<Vec<_>>(),
            vec!["f2", "f4"]
        );
        assert_eq!(rejected.len(), 2);
        assert!(matches!(rejected[0], NotExportable::DuplicateName { .. }));
        assert!(matches!(rejected[1], NotExportable::NotOnPlatform { .. }));
    }
}
