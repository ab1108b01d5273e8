use anyhow::{Context, Result};
use log::info;
use sbg_client::{Client, Member, NewProject, Permissions};
use std::{fs, path::PathBuf};
use structopt::StructOpt;

use crate::{
    commands::{get::find_billing_group, should_run},
    errors::ValidationError,
    printer::Printer,
};

#[derive(Debug, StructOpt)]
pub struct CreateProjectArgs {
    #[structopt(long = "name")]
    /// Name of the new project
    name: Option<String>,

    #[structopt(long = "billing-group")]
    /// Name of the billing group to charge
    billing_group: Option<String>,

    #[structopt(long = "description")]
    /// Description of the new project
    description: Option<String>,

    #[structopt(long = "admin", number_of_values = 1)]
    /// User to add with admin permissions (can be repeated)
    admins: Vec<String>,

    #[structopt(long = "member", number_of_values = 1)]
    /// User to add with read, write, copy and execute permissions (can be repeated)
    members: Vec<String>,

    #[structopt(long = "from-issue", parse(from_os_str))]
    /// Body of a GitHub issue form with `Billing`, `Project_Name` and `Users` sections
    from_issue: Option<PathBuf>,

    #[structopt(long = "run")]
    /// Actually create the project
    run: bool,
}

/// Fields of the project request issue form.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IssueForm {
    pub billing: Option<String>,
    pub project_name: Option<String>,
    pub users: Vec<String>,
}

const NO_RESPONSE: &str = "_No response_";

/// Parse the markdown body GitHub renders for an issue form: one `### <field>` heading per
/// field, followed by its value.
pub fn parse_issue(body: &str) -> Result<IssueForm, ValidationError> {
    let mut form = IssueForm::default();
    for section in body.split("### ").skip(1) {
        let (field, value) = section.split_once('\n').unwrap_or((section, ""));
        let value = match value.trim() {
            "" | NO_RESPONSE => None,
            value => Some(value),
        };
        match field.trim() {
            "Billing" => form.billing = value.map(str::to_owned),
            "Project_Name" => form.project_name = value.map(str::to_owned),
            "Users" => form.users = value.map(split_users).unwrap_or_default(),
            field => {
                return Err(ValidationError::UnknownIssueField {
                    field: field.to_owned(),
                })
            }
        }
    }
    Ok(form)
}

fn split_users(users: &str) -> Vec<String> {
    users
        .split(',')
        .map(|user| user.split_whitespace().collect::<String>())
        .filter(|user| !user.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPlan {
    pub name: String,
    pub billing_group: String,
    pub description: Option<String>,
    pub members: Vec<Member>,
}

/// Combine the flags with the issue form, if any. Flags take precedence.
pub fn plan_project(
    args: &CreateProjectArgs,
    issue: Option<IssueForm>,
) -> Result<ProjectPlan, ValidationError> {
    let from_issue = issue.is_some();
    let issue = issue.unwrap_or_default();
    let required = |flag: &Option<String>,
                    field: Option<String>,
                    issue_field: &str,
                    message: &'static str| {
        match (flag.clone().or(field), from_issue) {
            (Some(value), _) => Ok(value),
            (None, true) => Err(ValidationError::MissingIssueField {
                field: issue_field.to_owned(),
            }),
            (None, false) => Err(ValidationError::Arguments(message)),
        }
    };

    let name = required(
        &args.name,
        issue.project_name,
        "Project_Name",
        "--name is required unless --from-issue is given",
    )?;
    let billing_group = required(
        &args.billing_group,
        issue.billing,
        "Billing",
        "--billing-group is required unless --from-issue is given",
    )?;

    let mut members: Vec<Member> = Vec::new();
    let mut add = |username: &str, permissions: Permissions| {
        if !members.iter().any(|member| member.username == username) {
            members.push(Member {
                username: username.to_owned(),
                permissions,
            });
        }
    };
    args.admins
        .iter()
        .for_each(|user| add(user, Permissions::admin()));
    args.members
        .iter()
        .chain(issue.users.iter())
        .for_each(|user| add(user, Permissions::member()));

    Ok(ProjectPlan {
        name,
        billing_group,
        description: args.description.clone(),
        members,
    })
}

pub fn create(
    client: &Client,
    args: &CreateProjectArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let issue = match &args.from_issue {
        Some(path) => {
            let body = fs::read_to_string(path)
                .with_context(|| format!("Could not read issue `{}`", path.display()))?;
            Some(parse_issue(&body)?)
        }
        None => None,
    };
    let plan = plan_project(args, issue)?;
    let billing_group = find_billing_group(client, &plan.billing_group, page_size)?;

    info!(
        "Project `{}` charged to `{}` ({})",
        plan.name, billing_group.name, billing_group.id
    );
    for member in &plan.members {
        info!(
            "Member `{}`{}",
            member.username,
            if member.permissions.admin {
                " (admin)"
            } else {
                ""
            }
        );
    }
    if !should_run(args.run, format!("create project `{}`", plan.name)) {
        return Ok(());
    }

    let project = client
        .create_project(NewProject {
            name: &plan.name,
            billing_group: &billing_group.id.0,
            description: plan.description.as_deref(),
        })
        .context("Operation to create a project has failed.")?;
    info!("Created project `{}`", project.id);

    for member in &plan.members {
        client
            .add_project_member(&project.id, &member.username, member.permissions)
            .with_context(|| {
                format!(
                    "Could not add `{}` to project `{}`",
                    member.username, project.id
                )
            })?;
        info!("Added `{}` to `{}`", member.username, project.id);
    }

    printer.print_resources(&[project])?;
    printer.print_resources(&plan.members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ISSUE: &str = "### Billing\n\nLab Billing\n\n### Project_Name\n\nnew-cohort\n\n### Users\n\nbob, carol ,\n";

    fn args() -> CreateProjectArgs {
        CreateProjectArgs {
            name: None,
            billing_group: None,
            description: None,
            admins: vec!["alice".to_owned()],
            members: Vec::new(),
            from_issue: None,
            run: false,
        }
    }

    #[test]
    fn test_parse_issue() {
        assert_eq!(
            parse_issue(ISSUE).unwrap(),
            IssueForm {
                billing: Some("Lab Billing".to_owned()),
                project_name: Some("new-cohort".to_owned()),
                users: vec!["bob".to_owned(), "carol".to_owned()],
            }
        );
    }

    #[test]
    fn test_parse_issue_ignores_no_response() {
        let form = parse_issue("### Project_Name\r\n\r\nx\r\n\r\n### Users\n\n_No response_\n")
            .unwrap();
        assert_eq!(form.project_name.as_deref(), Some("x"));
        assert!(form.users.is_empty());
    }

    #[test]
    fn test_parse_issue_rejects_unknown_fields() {
        assert!(matches!(
            parse_issue("### Budget\n\n100\n"),
            Err(ValidationError::UnknownIssueField { field }) if field == "Budget"
        ));
    }

    #[test]
    fn test_plan_project_from_issue() {
        let mut args = args();
        args.members = vec!["alice".to_owned(), "dave".to_owned()];
        let plan = plan_project(&args, Some(parse_issue(ISSUE).unwrap())).unwrap();

        assert_eq!(plan.name, "new-cohort");
        assert_eq!(plan.billing_group, "Lab Billing");
        assert_eq!(
            plan.members
                .iter()
                .map(|member| (member.username.as_str(), member.permissions.admin))
                .collect::<Vec<_>>(),
            vec![
                ("alice", true),
                ("dave", false),
                ("bob", false),
                ("carol", false)
            ]
        );
    }

    #[test]
    fn test_plan_project_requires_name_and_billing_group() {
        assert!(matches!(
            plan_project(&args(), None),
            Err(ValidationError::Arguments(_))
        ));
        assert!(matches!(
            plan_project(&args(), Some(parse_issue("### Billing\n\nLab\n").unwrap())),
            Err(ValidationError::MissingIssueField { field }) if field == "Project_Name"
        ));
    }
}
