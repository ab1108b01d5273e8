//! Turning an options file (one task per row, one workflow input per column) into draft tasks.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use sbg_client::{resolve_file, FileStore, NewTask, ProjectId};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::{
    errors::ValidationError,
    utils::{
        tables::Table,
        workflow::{coerce_value, file_object, WorkflowInputs},
    },
};

/// Input whose value, when set, names the task instead of the row number.
pub const OUTPUT_BASENAME: &str = "output_basename";

/// Split `name=value` assignments, checking every name is an input of the workflow.
pub fn parse_assignments(
    assignments: &[String],
    inputs: &WorkflowInputs,
) -> Result<Vec<(String, String)>, ValidationError> {
    assignments
        .iter()
        .map(|assignment| {
            let (name, value) = assignment.split_once('=').ok_or_else(|| {
                ValidationError::BadAssignment {
                    assignment: assignment.clone(),
                }
            })?;
            let name = name.trim();
            inputs.expect(name)?;
            Ok((name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

/// Fail if any column of `options` is not an input of the workflow.
pub fn check_columns(options: &Table, inputs: &WorkflowInputs) -> Result<(), ValidationError> {
    options
        .headers()
        .iter()
        .try_for_each(|column| inputs.expect(column).map(|_| ()))
}

/// `<app>_<YYYYMMDD>_<suffix>`, where `<app>` is the last segment of the app id.
pub fn task_name(app: &str, date: NaiveDate, suffix: &str) -> String {
    let app = app.rsplit('/').next().unwrap_or(app);
    format!("{}_{}_{}", app, date.format("%Y%m%d"), suffix)
}

/// Everything needed to turn rows into tasks.
pub struct TaskPlan<'a> {
    pub project: &'a ProjectId,
    pub app: &'a str,
    pub inputs: &'a WorkflowInputs,
    pub defaults: &'a [(String, String)],
    pub date: NaiveDate,
    pub page_size: usize,
}

impl TaskPlan<'_> {
    /// One draft task per data row of `options`.
    ///
    /// Every column is checked before any file is looked up. File names are resolved in the
    /// project once, even when several rows use the same file.
    pub fn tasks<StoreT>(&self, store: &StoreT, options: &Table) -> Result<Vec<NewTask>>
    where
        StoreT: FileStore + ?Sized,
    {
        check_columns(options, self.inputs)?;

        let mut resolved: HashMap<String, Value> = HashMap::new();
        let mut resolve = |name: &str| -> Result<Value> {
            if let Some(value) = resolved.get(name) {
                return Ok(value.clone());
            }
            let file = resolve_file(store, self.project, name, self.page_size)
                .with_context(|| format!("Could not find file `{name}` in `{}`", self.project))?;
            debug!("Resolved `{}` to `{}`", name, file.id);
            let value = file_object(&file);
            resolved.insert(name.to_owned(), value.clone());
            Ok(value)
        };

        let mut tasks = Vec::with_capacity(options.len());
        for (index, row) in options.rows().enumerate() {
            let row_number = index + 1;

            // Columns replace defaults, empty cells do not.
            let mut raw_values: Vec<(&str, &str)> = self
                .defaults
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            for (column, value) in row.cells().filter(|(_, value)| !value.is_empty()) {
                raw_values.retain(|(name, _)| *name != column);
                raw_values.push((column, value));
            }

            let mut task_inputs = Map::new();
            for (name, raw) in &raw_values {
                let input_type = self.inputs.expect(name)?;
                if let Some(value) = coerce_value(name, input_type, raw, &mut resolve)
                    .with_context(|| format!("Bad value for `{name}` on row {row_number}"))?
                {
                    task_inputs.insert((*name).to_owned(), value);
                }
            }

            let suffix = match task_inputs.get(OUTPUT_BASENAME) {
                Some(Value::String(basename)) => basename.clone(),
                _ => row_number.to_string(),
            };
            tasks.push(NewTask {
                name: task_name(self.app, self.date, &suffix),
                project: self.project.0.clone(),
                app: self.app.to_owned(),
                inputs: task_inputs,
            });
        }
        Ok(tasks)
    }
}
