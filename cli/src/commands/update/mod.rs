mod metadata;
mod rename;

use self::{metadata::UpdateMetadataArgs, rename::UpdateRenameArgs};
use anyhow::Result;
use sbg_client::Client;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub enum UpdateArgs {
    #[structopt(name = "rename")]
    /// Rename files listed in a TSV with `Current Name` and `New Name` columns
    Rename(UpdateRenameArgs),

    #[structopt(name = "metadata")]
    /// Tag files with the sample metadata of their Bioassay ID
    Metadata(UpdateMetadataArgs),
}

pub fn run(update_args: &UpdateArgs, client: &Client, page_size: usize) -> Result<()> {
    match update_args {
        UpdateArgs::Rename(rename_args) => rename::rename(client, rename_args, page_size),
        UpdateArgs::Metadata(metadata_args) => metadata::update(client, metadata_args, page_size),
    }
}
