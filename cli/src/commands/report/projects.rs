use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use prettytable::{cell, row, Row};
use sbg_client::{Client, Member, ProjectId};
use serde::Serialize;
use structopt::StructOpt;

use crate::{
    commands::DEFAULT_WEB_BASE,
    printer::{DisplayTable, Printer},
};

#[derive(Debug, StructOpt)]
pub struct ReportProjectsArgs {
    #[structopt(long = "admin", number_of_values = 1)]
    /// User who should be an admin of every project (can be repeated)
    admins: Vec<String>,

    #[structopt(long = "web-base", default_value = DEFAULT_WEB_BASE)]
    /// Base of the platform's web URLs
    web_base: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectReport {
    pub project: ProjectId,
    pub users: Vec<String>,
    pub url: String,
    pub admins_ok: bool,
}

impl DisplayTable for ProjectReport {
    fn to_table_headers() -> Row {
        row![bFg => "Project", "Users", "URL", "Admins"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.project.0,
            self.users.join(","),
            self.url,
            if self.admins_ok {
                "Yes".green()
            } else {
                "No".red()
            }
        ]
    }
}

/// Whether every one of `admins` is a member with admin permissions.
fn has_admins(members: &[Member], admins: &[String]) -> bool {
    admins.iter().all(|admin| {
        members
            .iter()
            .any(|member| member.username == *admin && member.permissions.admin)
    })
}

pub fn report(
    client: &Client,
    args: &ReportProjectsArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let user = client
        .get_current_user()
        .context("Operation to get the current user has failed.")?;
    let projects = client
        .get_all_projects(page_size)
        .context("Operation to list projects has failed.")?
        .into_iter()
        .filter(|project| project.id.owner() == user.username)
        .collect::<Vec<_>>();
    info!("`{}` owns {} projects", user.username, projects.len());

    let mut reports = Vec::with_capacity(projects.len());
    for project in projects {
        let members = client
            .get_all_project_members(&project.id, page_size)
            .with_context(|| format!("Could not list the members of `{}`", project.id))?;
        reports.push(ProjectReport {
            url: format!(
                "{}/{}",
                args.web_base.trim_end_matches('/'),
                project.id
            ),
            users: members.iter().map(|member| member.username.clone()).collect(),
            admins_ok: has_admins(&members, &args.admins),
            project: project.id,
        });
    }
    printer.print_resources(&reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbg_client::Permissions;

    fn member(username: &str, permissions: Permissions) -> Member {
        Member {
            username: username.to_owned(),
            permissions,
        }
    }

    #[test]
    fn test_has_admins() {
        let members = vec![
            member("alice", Permissions::admin()),
            member("bob", Permissions::member()),
            member("carol", Permissions::admin()),
        ];
        let admins = |names: &[&str]| names.iter().map(|name| name.to_string()).collect::<Vec<_>>();

        assert!(has_admins(&members, &admins(&["alice", "carol"])));
        assert!(!has_admins(&members, &admins(&["alice", "bob"])));
        assert!(!has_admins(&members, &admins(&["dave"])));
        assert!(has_admins(&members, &[]));
    }
}
