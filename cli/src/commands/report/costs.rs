use anyhow::Result;
use log::{info, warn};
use prettytable::{cell, row, Row};
use sbg_client::{Client, ProjectId, Task, TaskId};
use serde::Serialize;
use structopt::StructOpt;

use crate::{
    printer::{DisplayTable, Printer},
    utils::lookup::{project_tasks, StatusFilter},
};

const ALL_APPS: &str = "all";

#[derive(Debug, StructOpt)]
pub struct ReportCostsArgs {
    #[structopt(long = "project")]
    /// Project whose tasks to summarise, as <owner>/<project>
    project: ProjectId,

    #[structopt(long = "status", default_value = "COMPLETED")]
    /// Comma separated statuses of the tasks to include
    status: StatusFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub app: String,
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    /// Sample standard deviation, only defined for two tasks or more.
    pub stdev: Option<f64>,
    pub highest_id: TaskId,
    pub highest: f64,
    pub lowest_id: TaskId,
    pub lowest: f64,
}

impl DisplayTable for CostSummary {
    fn to_table_headers() -> Row {
        row![bFg => "App", "Tasks", "Total", "Mean", "Stdev", "Highest Task", "Highest", "Lowest Task", "Lowest"]
    }

    fn to_table_row(&self) -> Row {
        let amount = |value: f64| format!("{value:.2}");
        row![
            self.app,
            self.count,
            amount(self.total),
            amount(self.mean),
            self.stdev.map(amount).unwrap_or_default(),
            self.highest_id.0,
            amount(self.highest),
            self.lowest_id.0,
            amount(self.lowest)
        ]
    }
}

struct CostGroup<'a> {
    app: &'a str,
    tasks: Vec<&'a Task>,
}

impl CostGroup<'_> {
    fn summary(&self) -> Option<CostSummary> {
        let first = self.tasks.first()?;
        let costs = self.tasks.iter().map(|task| task.cost()).collect::<Vec<_>>();
        let count = costs.len();
        let total: f64 = costs.iter().sum();
        let mean = total / count as f64;
        let stdev = (count >= 2).then(|| {
            let squares: f64 = costs.iter().map(|cost| (cost - mean).powi(2)).sum();
            (squares / (count - 1) as f64).sqrt()
        });

        // Ties go to the task listed last.
        let mut highest = *first;
        let mut lowest = *first;
        for &task in &self.tasks {
            if task.cost() >= highest.cost() {
                highest = task;
            }
            if task.cost() <= lowest.cost() {
                lowest = task;
            }
        }

        Some(CostSummary {
            app: self.app.to_owned(),
            count,
            total,
            mean,
            stdev,
            highest_id: highest.id.clone(),
            highest: highest.cost(),
            lowest_id: lowest.id.clone(),
            lowest: lowest.cost(),
        })
    }
}

/// Cost statistics over all the tasks, followed by one summary per app in order of first
/// appearance.
pub fn cost_summaries(tasks: &[Task]) -> Vec<CostSummary> {
    let mut groups = vec![CostGroup {
        app: ALL_APPS,
        tasks: tasks.iter().collect(),
    }];
    for task in tasks {
        let app = task.app_name().unwrap_or("unknown");
        match groups.iter_mut().skip(1).find(|group| group.app == app) {
            Some(group) => group.tasks.push(task),
            None => groups.push(CostGroup {
                app,
                tasks: vec![task],
            }),
        }
    }
    groups.iter().filter_map(CostGroup::summary).collect()
}

pub fn report(
    client: &Client,
    args: &ReportCostsArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let tasks = project_tasks(client, &args.project, Some(&args.status), page_size)?;
    if tasks.is_empty() {
        warn!("No matching tasks in `{}`", args.project);
        return Ok(());
    }
    info!("Summarising the cost of {} tasks", tasks.len());
    printer.print_resources(&cost_summaries(&tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sbg_client::TaskStatus;
    use serde_json::json;

    fn task(id: &str, app: &str, amount: f64) -> Task {
        Task {
            id: TaskId(id.to_owned()),
            app: Some(app.to_owned()),
            status: TaskStatus::Completed,
            price: serde_json::from_value(json!({"currency": "USD", "amount": amount})).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cost_summaries_per_app() {
        let tasks = vec![
            task("t1", "alice/test/align/3", 2.0),
            task("t2", "alice/test/call/1", 5.0),
            task("t3", "alice/test/align/4", 4.0),
            task("t4", "alice/test/align/4", 4.0),
        ];
        let summaries = cost_summaries(&tasks);

        assert_eq!(
            summaries
                .iter()
                .map(|summary| (summary.app.as_str(), summary.count, summary.total))
                .collect::<Vec<_>>(),
            vec![("all", 4, 15.0), ("align", 3, 10.0), ("call", 1, 5.0)]
        );

        let align = &summaries[1];
        assert!((align.mean - 10.0 / 3.0).abs() < 1e-9);
        assert!((align.stdev.unwrap() - (4.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(align.highest_id, TaskId("t4".to_owned()));
        assert_eq!(align.lowest_id, TaskId("t1".to_owned()));

        let call = &summaries[2];
        assert_eq!(call.stdev, None);
        assert_eq!(call.highest_id, call.lowest_id);
    }

    #[test]
    fn test_cost_summaries_without_tasks() {
        assert!(cost_summaries(&[]).is_empty());
    }
}
