//! Input types of CWL workflows, and coercion of text cells into task input values.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{json, Number, Value as JsonValue};
use serde_yaml::Value as YamlValue;
use std::{fmt, fs::File as FsFile, path::Path};

use crate::errors::ValidationError;
use sbg_client::File;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    File,
    Bool,
    Int,
    Float,
    String,
}

impl InputKind {
    fn describe(self) -> &'static str {
        match self {
            InputKind::File => "file",
            InputKind::Bool => "boolean",
            InputKind::Int => "integer",
            InputKind::Float => "float",
            InputKind::String => "string",
        }
    }

    fn from_token(token: &str) -> Self {
        if token.starts_with("File") || token.starts_with("Directory") {
            InputKind::File
        } else if token.starts_with("boolean") {
            InputKind::Bool
        } else if token.starts_with("int") {
            InputKind::Int
        } else if token.starts_with("float") {
            InputKind::Float
        } else {
            InputKind::String
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.describe())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputType {
    pub kind: InputKind,
    pub is_array: bool,
}

impl InputType {
    const STRING: InputType = InputType::scalar(InputKind::String);

    const fn scalar(kind: InputKind) -> Self {
        Self {
            kind,
            is_array: false,
        }
    }

    const fn array(kind: InputKind) -> Self {
        Self {
            kind,
            is_array: true,
        }
    }
}

/// The declared inputs of a workflow, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowInputs {
    name: String,
    inputs: Vec<(String, InputType)>,
}

impl WorkflowInputs {
    /// The workflow's file stem, which is expected to match the app name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, id: &str) -> Option<InputType> {
        self.inputs
            .iter()
            .find(|(input, _)| input == id)
            .map(|(_, input_type)| *input_type)
    }

    /// Type of `id`, or a validation error if the workflow does not declare it.
    pub fn expect(&self, id: &str) -> Result<InputType, ValidationError> {
        self.get(id).ok_or_else(|| ValidationError::UnknownInput {
            column: id.to_owned(),
            workflow: self.name.clone(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, InputType)> {
        self.inputs
            .iter()
            .map(|(id, input_type)| (id.as_str(), *input_type))
    }
}

/// File name up to the first `.`, `bwa-mem.cwl.yaml` gives `bwa-mem`.
pub fn workflow_stem(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_owned))
        .unwrap_or_default()
}

pub fn read_workflow(path: impl AsRef<Path>) -> Result<WorkflowInputs> {
    let path = path.as_ref();
    let file = FsFile::open(path)
        .with_context(|| format!("Could not open workflow `{}`", path.display()))?;
    let document: YamlValue = serde_yaml::from_reader(file)
        .with_context(|| format!("Could not parse workflow `{}`", path.display()))?;
    infer_input_types(&workflow_stem(path), &document)
        .with_context(|| format!("Could not read inputs of workflow `{}`", path.display()))
}

/// Classify every input of a CWL document.
///
/// `inputs` is either a sequence of `{id, type}` mappings, as exported by the platform, or a
/// mapping from id to a type token or to a mapping with a `type` key.
pub fn infer_input_types(name: &str, document: &YamlValue) -> Result<WorkflowInputs> {
    let inputs = document
        .get("inputs")
        .ok_or_else(|| anyhow!("Workflow has no `inputs` section"))?;

    let inputs = match inputs {
        YamlValue::Sequence(entries) => entries
            .iter()
            .map(|entry| {
                let id = entry
                    .get("id")
                    .and_then(YamlValue::as_str)
                    .ok_or_else(|| anyhow!("Workflow input without an `id`"))?;
                let input_type = entry.get("type").map_or(InputType::STRING, classify);
                Ok((id.trim_start_matches('#').to_owned(), input_type))
            })
            .collect::<Result<Vec<_>>>()?,
        YamlValue::Mapping(entries) => entries
            .iter()
            .map(|(id, declaration)| {
                let id = id
                    .as_str()
                    .ok_or_else(|| anyhow!("Workflow input id `{:?}` is not a string", id))?;
                let input_type = match declaration {
                    YamlValue::Mapping(_) => declaration.get("type").map_or(InputType::STRING, classify),
                    other => classify(other),
                };
                Ok((id.to_owned(), input_type))
            })
            .collect::<Result<Vec<_>>>()?,
        YamlValue::Null => Vec::new(),
        _ => return Err(anyhow!("Workflow `inputs` must be a sequence or a mapping")),
    };

    Ok(WorkflowInputs {
        name: name.to_owned(),
        inputs,
    })
}

fn classify(declared: &YamlValue) -> InputType {
    match declared {
        YamlValue::String(token) => InputType {
            kind: InputKind::from_token(token),
            is_array: token.contains("[]"),
        },
        YamlValue::Sequence(members) => {
            let mut members = members
                .iter()
                .filter(|member| member.as_str() != Some("null"));
            match (members.next(), members.next()) {
                (Some(single), None) => classify(single),
                _ => InputType::STRING,
            }
        }
        YamlValue::Mapping(_) => match declared.get("type").and_then(YamlValue::as_str) {
            Some("array") => {
                let items = declared.get("items").map_or(InputType::STRING, classify);
                InputType::array(items.kind)
            }
            Some(token @ ("File" | "Directory" | "boolean" | "int" | "float")) => {
                InputType::scalar(InputKind::from_token(token))
            }
            _ => InputType::STRING,
        },
        _ => InputType::STRING,
    }
}

/// The task input value of a `File`, as the platform expects it.
pub fn file_object(file: &File) -> JsonValue {
    json!({
        "class": "File",
        "path": file.id.0,
        "name": file.name,
    })
}

/// Convert the text `raw` into a value for `input`.
///
/// Empty text gives `None`, leaving the input unset. Array inputs are split on commas and each
/// element converted on its own. File names are turned into file objects by `resolve_file`.
pub fn coerce_value(
    input: &str,
    input_type: InputType,
    raw: &str,
    resolve_file: &mut dyn FnMut(&str) -> Result<JsonValue>,
) -> Result<Option<JsonValue>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if input_type.is_array {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|element| !element.is_empty())
            .map(|element| coerce_scalar(input, input_type.kind, element, resolve_file))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(JsonValue::Array(values)))
    } else {
        coerce_scalar(input, input_type.kind, raw, resolve_file).map(Some)
    }
}

fn coerce_scalar(
    input: &str,
    kind: InputKind,
    raw: &str,
    resolve_file: &mut dyn FnMut(&str) -> Result<JsonValue>,
) -> Result<JsonValue> {
    let bad_value = || ValidationError::BadValue {
        input: input.to_owned(),
        value: raw.to_owned(),
        kind: kind.describe(),
    };

    Ok(match kind {
        InputKind::File => resolve_file(raw)?,
        InputKind::Bool => JsonValue::Bool(raw.to_lowercase() == "true"),
        InputKind::Int => JsonValue::Number(raw.parse::<i64>().map_err(|_| bad_value())?.into()),
        InputKind::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(JsonValue::Number)
            .ok_or_else(bad_value)?,
        InputKind::String => JsonValue::String(raw.to_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn inputs(yaml: &str) -> WorkflowInputs {
        infer_input_types("wf", &serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    fn no_files(name: &str) -> Result<JsonValue> {
        panic!("unexpected file lookup for {name}")
    }

    #[test]
    fn test_string_tokens() {
        let inputs = inputs(
            r#"
inputs:
  reads: File
  reference: "File?"
  bams: "File[]"
  index_dir: Directory
  paired: boolean
  threads: int
  ratio: float
  names: "string[]"
  mode: string
"#,
        );

        let kinds = inputs
            .iter()
            .map(|(id, input_type)| (id, input_type.kind, input_type.is_array))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ("reads", InputKind::File, false),
                ("reference", InputKind::File, false),
                ("bams", InputKind::File, true),
                ("index_dir", InputKind::File, false),
                ("paired", InputKind::Bool, false),
                ("threads", InputKind::Int, false),
                ("ratio", InputKind::Float, false),
                ("names", InputKind::String, true),
                ("mode", InputKind::String, false),
            ]
        );
    }

    #[test]
    fn test_exported_sequence_with_structured_types() {
        let inputs = inputs(
            r##"
inputs:
  - id: "#input_bam"
    type: File
  - id: reference_fastas
    type: {type: array, items: File}
  - id: optional_bed
    type: ["null", "File"]
  - id: caller
    type: {type: enum, symbols: [strelka, mutect]}
  - id: threshold
    type: {type: float}
  - id: either
    type: ["int", "string"]
"##,
        );

        assert_eq!(inputs.get("input_bam"), Some(InputType::scalar(InputKind::File)));
        assert_eq!(
            inputs.get("reference_fastas"),
            Some(InputType::array(InputKind::File))
        );
        assert_eq!(
            inputs.get("optional_bed"),
            Some(InputType::scalar(InputKind::File))
        );
        assert_eq!(inputs.get("caller"), Some(InputType::STRING));
        assert_eq!(
            inputs.get("threshold"),
            Some(InputType::scalar(InputKind::Float))
        );
        assert_eq!(inputs.get("either"), Some(InputType::STRING));
        assert_eq!(inputs.get("missing"), None);
    }

    #[test]
    fn test_mapping_with_type_key() {
        let inputs = inputs(
            r#"
inputs:
  output_basename: {type: string, doc: "Prefix of outputs"}
  cores: {type: "int?", default: 16}
"#,
        );
        assert_eq!(inputs.get("output_basename"), Some(InputType::STRING));
        assert_eq!(inputs.get("cores"), Some(InputType::scalar(InputKind::Int)));
    }

    #[test]
    fn test_missing_inputs_section() {
        let document = serde_yaml::from_str("class: Workflow").unwrap();
        assert!(infer_input_types("wf", &document).is_err());
    }

    #[test]
    fn test_workflow_stem() {
        assert_eq!(workflow_stem(Path::new("cwl/bwa-mem.cwl")), "bwa-mem");
        assert_eq!(workflow_stem(Path::new("kf-align.cwl.yaml")), "kf-align");
    }

    #[test]
    fn test_coerce_scalars() {
        let coerce = |kind, raw| {
            coerce_value("input", InputType::scalar(kind), raw, &mut no_files).unwrap()
        };

        assert_eq!(coerce(InputKind::Bool, "True"), Some(json!(true)));
        assert_eq!(coerce(InputKind::Bool, "yes"), Some(json!(false)));
        assert_eq!(coerce(InputKind::Int, "42"), Some(json!(42)));
        assert_eq!(coerce(InputKind::Float, "0.5"), Some(json!(0.5)));
        assert_eq!(coerce(InputKind::String, "S1"), Some(json!("S1")));
        assert_eq!(coerce(InputKind::Int, ""), None);
    }

    #[test]
    fn test_coerce_rejects_bad_numbers() {
        for (kind, raw) in [(InputKind::Int, "4.5"), (InputKind::Float, "lots")] {
            let error =
                coerce_value("threads", InputType::scalar(kind), raw, &mut no_files).unwrap_err();
            assert!(matches!(
                error.downcast_ref::<ValidationError>(),
                Some(ValidationError::BadValue { .. })
            ));
        }
    }

    #[test]
    fn test_coerce_arrays_resolves_each_file() {
        let mut looked_up = Vec::new();
        let mut resolve = |name: &str| {
            looked_up.push(name.to_owned());
            Ok::<_, anyhow::Error>(json!({"class": "File", "path": format!("id-{name}"), "name": name}))
        };

        let value = coerce_value(
            "bams",
            InputType::array(InputKind::File),
            "a.bam, b.bam,",
            &mut resolve,
        )
        .unwrap();

        assert_eq!(looked_up, vec!["a.bam", "b.bam"]);
        assert_eq!(
            value,
            Some(json!([
                {"class": "File", "path": "id-a.bam", "name": "a.bam"},
                {"class": "File", "path": "id-b.bam", "name": "b.bam"}
            ]))
        );

        let ints = coerce_value("sizes", InputType::array(InputKind::Int), "1,2,3", &mut no_files)
            .unwrap();
        assert_eq!(ints, Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_file_object() {
        let file = File {
            id: sbg_client::FileId("5f1a".to_owned()),
            name: "file.bam".to_owned(),
            ..Default::default()
        };
        assert_eq!(
            file_object(&file),
            json!({"class": "File", "path": "5f1a", "name": "file.bam"})
        );
    }
}
