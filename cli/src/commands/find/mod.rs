mod files;
mod tasks;

use anyhow::Result;
use sbg_client::Client;
use structopt::StructOpt;

use self::{
    files::{FindExportableArgs, FindFileArgs, FindFilesByMetadataArgs, FindProjectOfFileArgs},
    tasks::{FindLogsArgs, FindTasksArgs, FindUrlArgs},
};
use crate::printer::Printer;

#[derive(Debug, StructOpt)]
pub enum FindArgs {
    #[structopt(name = "file")]
    /// Find a file by name anywhere in a project
    File(FindFileArgs),

    #[structopt(name = "files-by-metadata")]
    /// Find the files whose metadata matches the values of a TSV column
    FilesByMetadata(FindFilesByMetadataArgs),

    #[structopt(name = "exportable")]
    /// List the files which can be exported to a volume
    Exportable(FindExportableArgs),

    #[structopt(name = "tasks")]
    /// List the tasks of a project
    Tasks(FindTasksArgs),

    #[structopt(name = "logs")]
    /// List the log files of completed tasks
    Logs(FindLogsArgs),

    #[structopt(name = "url")]
    /// Print the web page of a task or a file
    Url(FindUrlArgs),

    #[structopt(name = "project-of-file")]
    /// Search every accessible project for files by name
    ProjectOfFile(FindProjectOfFileArgs),
}

pub fn run(args: &FindArgs, client: &Client, printer: &Printer, page_size: usize) -> Result<()> {
    match args {
        FindArgs::File(args) => files::find_file(client, args, printer, page_size),
        FindArgs::FilesByMetadata(args) => {
            files::find_by_metadata(client, args, printer, page_size)
        }
        FindArgs::Exportable(args) => files::find_exportable(client, args, printer, page_size),
        FindArgs::Tasks(args) => tasks::find_tasks(client, args, printer, page_size),
        FindArgs::Logs(args) => tasks::find_logs(client, args, printer, page_size),
        FindArgs::Url(args) => tasks::find_url(client, args),
        FindArgs::ProjectOfFile(args) => {
            files::find_project_of_file(client, args, printer, page_size)
        }
    }
}
