use colored::Colorize;
use prettytable::{cell, format, row, Row, Table};
use sbg_client::{BillingGroup, File, Member, Project, StorageBreakdown, Task, TaskStatus};
use serde::Serialize;

use anyhow::{anyhow, Context, Error, Result};
use std::{
    io::{self, Write},
    str::FromStr,
};

pub fn print_resources_as_json<Resource>(
    resources: impl IntoIterator<Item = Resource>,
    mut writer: impl Write,
) -> Result<()>
where
    Resource: Serialize,
{
    for resource in resources {
        serde_json::to_writer(&mut writer, &resource)
            .context("Could not serialise resource.")
            .and_then(|_| writeln!(writer).context("Failed to write JSON resource to writer."))?;
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        match string {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("unknown output format `{}`", string)),
        }
    }
}

/// Represents a resource that is able to be displayed as a table.
///
/// The implementation must implement `to_table_headers` to return headers for the resource type,
/// and `to_table_row`, which should return a data row for the given resource instance.
pub trait DisplayTable {
    fn to_table_headers() -> Row;

    fn to_table_row(&self) -> Row;
}

impl DisplayTable for File {
    fn to_table_headers() -> Row {
        row![bFg => "Name", "ID", "Project", "Storage", "Size", "Created (UTC)"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.name,
            self.id.0,
            self.project.as_deref().unwrap_or_default(),
            self.storage_type(),
            match self.size {
                Some(size) => crate::thousands::Thousands(size).to_string().normal(),
                None => "-".dimmed(),
            },
            match self.created_on {
                Some(created_on) => created_on.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => String::new(),
            }
        ]
    }
}

impl DisplayTable for Task {
    fn to_table_headers() -> Row {
        row![bFg => "Name", "ID", "Status", "App", "Price"]
    }

    fn to_table_row(&self) -> Row {
        let status = self.status.to_string();
        row![
            self.name,
            self.id.0,
            match self.status {
                TaskStatus::Completed => status.green(),
                TaskStatus::Failed | TaskStatus::Aborted => status.red(),
                TaskStatus::Draft => status.dimmed(),
                _ => status.normal(),
            },
            self.app.as_deref().unwrap_or_default(),
            match &self.price {
                Some(price) => format!("{:.2}", price.amount).normal(),
                None => "-".dimmed(),
            }
        ]
    }
}

impl DisplayTable for Project {
    fn to_table_headers() -> Row {
        row![bFg => "Name", "ID", "Billing Group", "Description"]
    }

    fn to_table_row(&self) -> Row {
        let full_name = format!(
            "{}{}{}",
            self.id.owner().dimmed(),
            "/".dimmed(),
            self.id.name()
        );
        row![
            full_name,
            self.id.0,
            self.billing_group.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        ]
    }
}

impl DisplayTable for Member {
    fn to_table_headers() -> Row {
        row![bFg => "Username", "Read", "Write", "Copy", "Execute", "Admin"]
    }

    fn to_table_row(&self) -> Row {
        let flag = |value: bool| if value { "Yes" } else { "No" };
        row![
            self.username,
            flag(self.permissions.read),
            flag(self.permissions.write),
            flag(self.permissions.copy),
            flag(self.permissions.execute),
            flag(self.permissions.admin)
        ]
    }
}

impl DisplayTable for BillingGroup {
    fn to_table_headers() -> Row {
        row![bFg => "Name", "ID", "Owner", "Balance"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.name,
            self.id.0,
            self.owner.as_deref().unwrap_or_default(),
            match &self.balance {
                Some(balance) => format!(
                    "{:.2} {}",
                    balance.amount,
                    balance.currency.as_deref().unwrap_or_default()
                ),
                None => String::new(),
            }
        ]
    }
}

impl DisplayTable for StorageBreakdown {
    fn to_table_headers() -> Row {
        row![bFg => "Project", "Created By", "Active", "Archived", "Total"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.project_name,
            self.project_created_by.as_deref().unwrap_or_default(),
            format!("{:.2}", self.active.cost.amount),
            format!("{:.2}", self.archived.cost.amount),
            format!("{:.2}", self.total_cost())
        ]
    }
}

/// Any type that can be converted into a table.
pub trait IntoTable {
    fn into_table(self) -> Table;
}

/// All iterators of resources can be converted into a table.
impl<'a, Iterable, Item: 'a> IntoTable for Iterable
where
    Iterable: IntoIterator<Item = &'a Item>,
    Item: DisplayTable,
{
    fn into_table(self) -> Table {
        let mut table = new_table();
        table.set_titles(Item::to_table_headers());
        for resource in self.into_iter() {
            table.add_row(resource.to_table_row());
        }
        table
    }
}

pub fn new_table() -> Table {
    let mut table = Table::new();
    let format = format::FormatBuilder::new()
        .column_separator(' ')
        .borders(' ')
        .separators(&[], format::LineSeparator::new('-', '+', '+', '+'))
        .padding(0, 1)
        .build();
    table.set_format(format);
    table
}

fn print_table<T: IntoTable>(resources: T) {
    let table = resources.into_table();
    table.printstd();
}

/// Print resources using the selected output format.
///
/// Resources passed to the printer must be able to be formatted using all supported
/// `OutputFormat`s.
#[derive(Default, Debug)]
pub struct Printer {
    output: OutputFormat,
}

impl Printer {
    pub fn new(output: OutputFormat) -> Self {
        Self { output }
    }

    pub fn print_resources<T, Resource>(&self, resources: T) -> Result<()>
    where
        T: IntoIterator<Item = Resource> + IntoTable,
        Resource: Serialize,
    {
        match self.output {
            OutputFormat::Table => print_table(resources),
            OutputFormat::Json => print_resources_as_json(resources, io::stdout().lock())?,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sbg_client::{FileId, TaskId};

    #[test]
    fn test_json_lines() {
        let tasks = vec![
            Task {
                id: TaskId("t1".to_owned()),
                name: "align_20240307_1".to_owned(),
                ..Default::default()
            },
            Task {
                id: TaskId("t2".to_owned()),
                name: "align_20240307_2".to_owned(),
                status: TaskStatus::Running,
                ..Default::default()
            },
        ];

        let mut output = Vec::new();
        print_resources_as_json(&tasks, &mut output).unwrap();
        let lines = String::from_utf8(output).unwrap();
        let statuses = lines
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["status"].clone())
            .collect::<Vec<_>>();
        assert_eq!(statuses, vec!["DRAFT", "RUNNING"]);
    }

    #[test]
    fn test_table_has_a_row_per_resource() {
        let files = vec![
            File {
                id: FileId("f1".to_owned()),
                name: "S1.bam".to_owned(),
                size: Some(1_234_567),
                ..Default::default()
            },
            File {
                id: FileId("f2".to_owned()),
                name: "S2.bam".to_owned(),
                ..Default::default()
            },
        ];
        let table = (&files).into_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get_row(0).unwrap().get_cell(0).unwrap().get_content(), "S1.bam");
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("json".parse(), Ok(OutputFormat::Json)));
        assert!(matches!("table".parse(), Ok(OutputFormat::Table)));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
