use anyhow::{Context, Result};
use log::{info, warn};
use sbg_client::{resolve_file, Client, File, FileStore, ProjectId};
use std::path::PathBuf;
use structopt::StructOpt;

use crate::{
    commands::should_run,
    utils::tables::{Delimiter, Table},
};

const CURRENT_NAME: &str = "Current Name";
const NEW_NAME: &str = "New Name";

#[derive(Debug, StructOpt)]
pub struct UpdateRenameArgs {
    #[structopt(long = "project")]
    /// Project holding the files, as <owner>/<project>
    project: ProjectId,

    #[structopt(long = "file", parse(from_os_str))]
    /// TSV file with `Current Name` and `New Name` columns
    file: PathBuf,

    #[structopt(long = "run")]
    /// Actually rename the files
    run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rename {
    pub file: File,
    pub new_name: String,
}

fn read_renames(table: &Table) -> Result<Vec<(String, String)>> {
    table.require(&[CURRENT_NAME, NEW_NAME])?;
    Ok(table
        .rows()
        .map(|row| (row.get(CURRENT_NAME).to_owned(), row.get(NEW_NAME).to_owned()))
        .collect())
}

/// Resolve every current name and drop the renames whose new name is already taken.
///
/// A current name which does not exist is an error: the file may have been renamed already.
pub fn plan_renames<StoreT>(
    store: &StoreT,
    project: &ProjectId,
    renames: Vec<(String, String)>,
    page_size: usize,
) -> Result<Vec<Rename>>
where
    StoreT: FileStore + ?Sized,
{
    let mut planned = Vec::with_capacity(renames.len());
    for (current_name, new_name) in renames {
        let file = resolve_file(store, project, &current_name, page_size).with_context(|| {
            format!("Could not find `{current_name}` in `{project}`, has it already been renamed?")
        })?;

        match resolve_file(store, project, &new_name, page_size) {
            Ok(_) => warn!("`{}` already exists in `{}`, skipping", new_name, project),
            Err(error) if error.is_not_found() => planned.push(Rename { file, new_name }),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Could not look up `{new_name}` in `{project}`"))
            }
        }
    }
    Ok(planned)
}

pub fn rename(client: &Client, args: &UpdateRenameArgs, page_size: usize) -> Result<()> {
    let renames = read_renames(&Table::read(&args.file, Delimiter::Tab)?)?;
    let planned = plan_renames(client, &args.project, renames, page_size)?;
    for rename in &planned {
        info!(
            "To rename: `{}` ({}) to `{}`",
            rename.file.name, rename.file.id, rename.new_name
        );
    }
    if !should_run(args.run, format!("rename {} files", planned.len())) {
        return Ok(());
    }

    for rename in &planned {
        let renamed = client
            .rename_file(&rename.file.id, &rename.new_name)
            .with_context(|| format!("Could not rename `{}`", rename.file.name))?;
        info!("File `{}` is now `{}`", renamed.id, renamed.name);
    }
    Ok(())
}
