//! Commands creating resources on the platform.
//!
//! - **Tasks**: draft tasks from a CWL workflow and an options file
//! - **Projects**: a project with its members, optionally from a GitHub issue form

pub mod project;
pub mod tasks;

use anyhow::Result;
use sbg_client::Client;
use structopt::StructOpt;

use self::{project::CreateProjectArgs, tasks::CreateTasksArgs};
use crate::printer::Printer;

#[derive(Debug, StructOpt)]
pub enum CreateArgs {
    #[structopt(name = "tasks")]
    /// Create one draft task per row of an options file
    Tasks(CreateTasksArgs),

    #[structopt(name = "project")]
    /// Create a project and add its members
    Project(CreateProjectArgs),
}

pub fn run(
    create_args: &CreateArgs,
    client: &Client,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    match create_args {
        CreateArgs::Tasks(args) => tasks::create(client, args, printer, page_size),
        CreateArgs::Project(args) => project::create(client, args, printer, page_size),
    }
}
