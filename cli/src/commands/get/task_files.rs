use anyhow::Result;
use log::info;
use sbg_client::Client;

use crate::{
    printer::Printer,
    utils::lookup::{completed_task_outputs, get_files, TaskSelection},
};

pub fn get(client: &Client, selection: &TaskSelection, printer: &Printer) -> Result<()> {
    let tasks = selection.fetch(client)?;
    let ids = completed_task_outputs(&tasks);
    info!("Found {} output files in {} tasks", ids.len(), tasks.len());

    let files = get_files(client, &ids)?;
    printer.print_resources(&files)
}
