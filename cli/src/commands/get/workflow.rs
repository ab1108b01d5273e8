use anyhow::Result;
use prettytable::{cell, row, Row};
use serde::Serialize;
use std::path::PathBuf;
use structopt::StructOpt;

use crate::{
    printer::{DisplayTable, Printer},
    utils::workflow::{read_workflow, InputKind, WorkflowInputs},
};

#[derive(Debug, StructOpt)]
pub struct GetWorkflowInputsArgs {
    #[structopt(name = "workflow", parse(from_os_str))]
    /// CWL workflow, in YAML or JSON
    workflow: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputRow {
    pub id: String,
    pub kind: InputKind,
    pub is_array: bool,
}

impl DisplayTable for InputRow {
    fn to_table_headers() -> Row {
        row![bFg => "Input", "Type", "Array"]
    }

    fn to_table_row(&self) -> Row {
        row![self.id, self.kind, if self.is_array { "Yes" } else { "No" }]
    }
}

fn input_rows(inputs: &WorkflowInputs) -> Vec<InputRow> {
    inputs
        .iter()
        .map(|(id, input_type)| InputRow {
            id: id.to_owned(),
            kind: input_type.kind,
            is_array: input_type.is_array,
        })
        .collect()
}

/// Print the inputs of a workflow, the columns an options file may have.
pub fn workflow_inputs(args: &GetWorkflowInputsArgs, printer: &Printer) -> Result<()> {
    let inputs = read_workflow(&args.workflow)?;
    printer.print_resources(&input_rows(&inputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_input_rows_keep_declaration_order() {
        let mut workflow = tempfile::Builder::new()
            .suffix(".cwl")
            .tempfile()
            .unwrap();
        write!(
            workflow,
            r#"
class: Workflow
inputs:
  - id: input_bam
    type: File
  - id: threads
    type: ["null", int]
  - id: known_sites
    type: {{type: array, items: File}}
"#
        )
        .unwrap();

        let inputs = read_workflow(workflow.path()).unwrap();
        assert_eq!(
            input_rows(&inputs),
            vec![
                InputRow {
                    id: "input_bam".to_owned(),
                    kind: InputKind::File,
                    is_array: false,
                },
                InputRow {
                    id: "threads".to_owned(),
                    kind: InputKind::Int,
                    is_array: false,
                },
                InputRow {
                    id: "known_sites".to_owned(),
                    kind: InputKind::File,
                    is_array: true,
                },
            ]
        );
    }
}
