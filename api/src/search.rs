//! Lookup of files by name across a project's folder tree.

use log::debug;

use crate::{
    error::{Error, Result},
    pagination::{fetch_all, Page},
    resources::{
        file::{File, Id as FileId},
        project::Id as ProjectId,
    },
};

/// The two listings needed to search a project, implemented by [`crate::Client`].
pub trait FileStore {
    /// Files at the root of `project`, restricted to those called `name` if given.
    fn query_files(
        &self,
        project: &ProjectId,
        name: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Page<File>>;

    /// Direct children of `folder`.
    fn list_folder(&self, folder: &FileId, limit: usize, offset: usize) -> Result<Page<File>>;
}

/// Visit every item of `listing` and all of their descendants exactly once, depth first.
///
/// Folders are expanded with an explicit stack, so the depth of the tree is only bounded by
/// memory.
pub fn walk_tree<StoreT>(
    store: &StoreT,
    listing: Vec<File>,
    page_size: usize,
    mut visit: impl FnMut(&File),
) -> Result<()>
where
    StoreT: FileStore + ?Sized,
{
    let mut pending: Vec<File> = listing.into_iter().rev().collect();
    while let Some(file) = pending.pop() {
        visit(&file);
        if file.is_folder() {
            let children = fetch_all(
                |limit, offset| store.list_folder(&file.id, limit, offset),
                page_size,
            )?;
            debug!("Folder `{}` has {} items", file.name, children.len());
            pending.extend(children.into_iter().rev());
        }
    }
    Ok(())
}

/// Every item named `name` in `listing` or below it.
pub fn find_by_name<StoreT>(
    store: &StoreT,
    listing: Vec<File>,
    name: &str,
    page_size: usize,
) -> Result<Vec<File>>
where
    StoreT: FileStore + ?Sized,
{
    let mut matches = Vec::new();
    walk_tree(store, listing, page_size, |file| {
        if file.name == name {
            matches.push(file.clone());
        }
    })?;
    Ok(matches)
}

/// All files in `project`: the root listing, or the whole tree when `recursive` is set.
/// Folders themselves are not returned.
pub fn list_project_files<StoreT>(
    store: &StoreT,
    project: &ProjectId,
    recursive: bool,
    page_size: usize,
) -> Result<Vec<File>>
where
    StoreT: FileStore + ?Sized,
{
    let root = fetch_all(
        |limit, offset| store.query_files(project, None, limit, offset),
        page_size,
    )?;
    if !recursive {
        return Ok(root.into_iter().filter(|file| !file.is_folder()).collect());
    }

    let mut files = Vec::new();
    walk_tree(store, root, page_size, |file| {
        if !file.is_folder() {
            files.push(file.clone());
        }
    })?;
    Ok(files)
}

/// The single file called `name` in `project`.
///
/// The platform only indexes names at the root of a project, so the indexed query is tried
/// first and the folder tree is only searched when it finds nothing. Several files with the
/// same name is an error at either step.
pub fn resolve_file<StoreT>(
    store: &StoreT,
    project: &ProjectId,
    name: &str,
    page_size: usize,
) -> Result<File>
where
    StoreT: FileStore + ?Sized,
{
    let at_root = fetch_all(
        |limit, offset| store.query_files(project, Some(name), limit, offset),
        page_size,
    )?;
    let matches = if at_root.is_empty() {
        debug!("`{name}` is not at the root of `{project}`, searching folders");
        let root = fetch_all(
            |limit, offset| store.query_files(project, None, limit, offset),
            page_size,
        )?;
        find_by_name(store, root, name, page_size)?
    } else {
        at_root
    };

    single_match(matches, project, name)
}

fn single_match(mut matches: Vec<File>, project: &ProjectId, name: &str) -> Result<File> {
    match matches.len() {
        0 => Err(Error::FileNotFound {
            project: project.0.clone(),
            name: name.to_owned(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(Error::AmbiguousFile {
            project: project.0.clone(),
            name: name.to_owned(),
            count,
        }),
    }
}
