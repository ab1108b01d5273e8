mod costs;
mod projects;

use self::{costs::ReportCostsArgs, projects::ReportProjectsArgs};
use crate::printer::Printer;
use anyhow::Result;
use sbg_client::Client;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub enum ReportArgs {
    #[structopt(name = "projects")]
    /// List the projects you own with their members
    Projects(ReportProjectsArgs),

    #[structopt(name = "costs")]
    /// Summarise the cost of the tasks of a project, per app
    Costs(ReportCostsArgs),
}

pub fn run(
    report_args: &ReportArgs,
    client: &Client,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    match report_args {
        ReportArgs::Projects(projects_args) => {
            projects::report(client, projects_args, printer, page_size)
        }
        ReportArgs::Costs(costs_args) => costs::report(client, costs_args, printer, page_size),
    }
}
