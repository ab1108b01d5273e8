mod files;
mod tasks;

use anyhow::Result;
use sbg_client::{Client, ProjectId};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub enum DeleteArgs {
    #[structopt(name = "tasks")]
    /// Delete the draft tasks of a project and abort the queued or running ones
    Tasks {
        #[structopt(long = "project")]
        /// Project of the tasks, as <owner>/<project>
        project: ProjectId,

        #[structopt(long = "run")]
        /// Actually delete and abort the tasks
        run: bool,
    },

    #[structopt(name = "files")]
    /// Delete files by id
    Files {
        #[structopt(long = "ids-file", parse(from_os_str))]
        /// File with one file id per line
        ids_file: PathBuf,

        #[structopt(long = "yes")]
        /// Do not ask for confirmation
        yes: bool,

        #[structopt(long = "run")]
        /// Actually delete the files
        run: bool,
    },

    #[structopt(name = "files-by-name")]
    /// Delete files of a project by name
    FilesByName {
        #[structopt(long = "project")]
        /// Project of the files, as <owner>/<project>
        project: ProjectId,

        #[structopt(long = "names-file", parse(from_os_str))]
        /// File with one file name per line
        names_file: PathBuf,

        #[structopt(long = "yes")]
        /// Do not ask for confirmation
        yes: bool,

        #[structopt(long = "run")]
        /// Actually delete the files
        run: bool,
    },

    #[structopt(name = "failed-outputs")]
    /// Delete the output files of the failed tasks of a project
    FailedOutputs {
        #[structopt(long = "project")]
        /// Project of the tasks, as <owner>/<project>
        project: ProjectId,

        #[structopt(long = "include-aborted")]
        /// Also delete the outputs of aborted tasks
        include_aborted: bool,

        #[structopt(long = "yes")]
        /// Do not ask for confirmation
        yes: bool,

        #[structopt(long = "run")]
        /// Actually delete the files
        run: bool,
    },
}

pub fn run(delete_args: &DeleteArgs, client: &Client, page_size: usize) -> Result<()> {
    match delete_args {
        DeleteArgs::Tasks { project, run } => tasks::delete_tasks(client, project, *run, page_size),
        DeleteArgs::Files { ids_file, yes, run } => {
            files::delete_by_id(client, ids_file, *yes, *run)
        }
        DeleteArgs::FilesByName {
            project,
            names_file,
            yes,
            run,
        } => files::delete_by_name(client, project, names_file, *yes, *run, page_size),
        DeleteArgs::FailedOutputs {
            project,
            include_aborted,
            yes,
            run,
        } => files::delete_failed_outputs(
            client,
            project,
            *include_aborted,
            *yes,
            *run,
            page_size,
        ),
    }
}
