use crate::common::{TestCli, TOKEN};
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;

const WORKFLOW: &str = r#"
cwlVersion: v1.2
class: Workflow
inputs:
  sample_name: string
  input_bam: File
  output_basename: "string?"
"#;

const OPTIONS: &str = "sample_name\tinput_bam\nS1\tfile.bam\n";

fn mock_file_lookup(cli: &mut TestCli) -> mockito::Mock {
    cli.server
        .mock("GET", "/files")
        .match_header("x-sbg-auth-token", TOKEN)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("project".into(), "alice/test".into()),
            Matcher::UrlEncoded("name".into(), "file.bam".into()),
        ]))
        .with_header("X-Total-Matching-Query", "1")
        .with_body(json!({"items": [{"id": "f1", "name": "file.bam"}]}).to_string())
        .create()
}

fn create_args(cli: &TestCli, options: &str) -> Vec<String> {
    let workflow = cli.write("align.cwl", WORKFLOW);
    let options = cli.write("options.tsv", options);
    vec![
        "create".to_owned(),
        "tasks".to_owned(),
        "--project".to_owned(),
        "alice/test".to_owned(),
        "--app".to_owned(),
        "alice/test/align".to_owned(),
        "--workflow".to_owned(),
        workflow.display().to_string(),
        "--options-file".to_owned(),
        options.display().to_string(),
    ]
}

#[test]
fn test_create_tasks_from_options_file() {
    let mut cli = TestCli::new();
    let lookup = mock_file_lookup(&mut cli);
    let create = cli
        .server
        .mock("POST", "/tasks")
        .match_header("x-sbg-auth-token", TOKEN)
        .match_body(Matcher::PartialJson(json!({
            "project": "alice/test",
            "app": "alice/test/align",
            "inputs": {
                "sample_name": "S1",
                "input_bam": {"class": "File", "path": "f1", "name": "file.bam"}
            }
        })))
        .with_status(201)
        .with_body(json!({"id": "t1", "name": "align_1", "status": "DRAFT"}).to_string())
        .expect(1)
        .create();

    let mut args = create_args(&cli, OPTIONS);
    args.push("--run".to_owned());
    let output = cli.run(&args);

    lookup.assert();
    create.assert();
    assert!(output.contains("t1"));
    assert_eq!(
        std::fs::read_to_string(cli.path("new_task_ids.txt")).unwrap(),
        "t1\n"
    );
}

#[test]
fn test_create_tasks_dry_run_creates_nothing() {
    let mut cli = TestCli::new();
    let _lookup = mock_file_lookup(&mut cli);
    let create = cli.server.mock("POST", "/tasks").expect(0).create();

    let output = cli.run(create_args(&cli, OPTIONS));

    create.assert();
    assert!(output.is_empty());
    assert!(!cli.path("new_task_ids.txt").exists());
}

#[test]
fn test_create_tasks_rejects_unknown_columns() {
    let mut cli = TestCli::new();
    let lookup = cli.server.mock("GET", "/files").expect(0).create();
    let error = cli.run_and_error(create_args(&cli, "sample_name\tcolour\nS1\tblue\n"));

    lookup.assert();
    assert!(error.contains("colour"));
}
