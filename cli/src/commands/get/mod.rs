mod billing;
mod task_files;
mod workflow;

use anyhow::Result;
use sbg_client::Client;
use structopt::StructOpt;

pub use self::{billing::find_billing_group, workflow::workflow_inputs};
use self::{
    billing::{GetBillingBreakdownArgs, GetBillingGroupArgs},
    workflow::GetWorkflowInputsArgs,
};
use crate::{printer::Printer, utils::lookup::TaskSelection};

#[derive(Debug, StructOpt)]
pub enum GetArgs {
    #[structopt(name = "billing-group")]
    /// Display a billing group by name
    BillingGroup(GetBillingGroupArgs),

    #[structopt(name = "billing-breakdown")]
    /// Display the storage costs of every project charged to a billing group
    BillingBreakdown(GetBillingBreakdownArgs),

    #[structopt(name = "task-files")]
    /// List the output files of completed tasks
    TaskFiles(TaskSelection),

    #[structopt(name = "workflow-inputs")]
    /// Display the inputs of a CWL workflow and their types
    WorkflowInputs(GetWorkflowInputsArgs),
}

pub fn run(args: &GetArgs, client: &Client, printer: &Printer, page_size: usize) -> Result<()> {
    match args {
        GetArgs::BillingGroup(args) => billing::get_group(client, args, printer, page_size),
        GetArgs::BillingBreakdown(args) => {
            billing::get_breakdown(client, args, printer, page_size)
        }
        GetArgs::TaskFiles(selection) => task_files::get(client, selection, printer),
        GetArgs::WorkflowInputs(args) => workflow_inputs(args, printer),
    }
}
