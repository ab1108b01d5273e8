use crate::common::TestCli;
use mockito::Matcher;
use serde_json::json;

#[test]
fn test_find_file_prints_id() {
    let mut cli = TestCli::new();
    let lookup = cli
        .server
        .mock("GET", "/files")
        .match_query(Matcher::UrlEncoded("name".into(), "S1.bam".into()))
        .with_header("X-Total-Matching-Query", "1")
        .with_body(
            json!({"items": [{"id": "f1", "name": "S1.bam", "project": "alice/test"}]})
                .to_string(),
        )
        .create();

    let output = cli.run(["--output", "json", "find", "file", "--project", "alice/test", "S1.bam"]);

    lookup.assert();
    let file: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(file["id"], "f1");
    assert_eq!(file["name"], "S1.bam");
}

#[test]
fn test_find_file_ambiguous_is_an_error() {
    let mut cli = TestCli::new();
    cli.server
        .mock("GET", "/files")
        .match_query(Matcher::UrlEncoded("name".into(), "S1.bam".into()))
        .with_header("X-Total-Matching-Query", "2")
        .with_body(
            json!({"items": [{"id": "f1", "name": "S1.bam"}, {"id": "f2", "name": "S1.bam"}]})
                .to_string(),
        )
        .create();

    let error = cli.run_and_error(["find", "file", "--project", "alice/test", "S1.bam"]);
    assert!(error.contains("S1.bam"));
}

#[test]
fn test_find_url_of_file() {
    let mut cli = TestCli::new();
    cli.server
        .mock("GET", "/tasks/f1")
        .with_status(404)
        .with_body(json!({"status": 404, "code": 4000, "message": "Not found"}).to_string())
        .create();
    cli.server
        .mock("GET", "/files/f1")
        .with_body(json!({"id": "f1", "name": "S1.bam", "project": "alice/test"}).to_string())
        .create();

    let output = cli.run(["find", "url", "f1"]);
    assert!(output.contains("https://cavatica.sbgenomics.com/u/alice/test/files/f1"));
}
