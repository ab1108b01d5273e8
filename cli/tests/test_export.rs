use crate::common::{TestCli, TOKEN};
use mockito::Matcher;
use serde_json::json;

fn mock_file(cli: &mut TestCli) -> mockito::Mock {
    cli.server
        .mock("GET", "/files/f1")
        .with_body(json!({"id": "f1", "name": "S1.bam", "project": "alice/test"}).to_string())
        .create()
}

fn export(state: &str) -> serde_json::Value {
    json!({"resource": {
        "id": "e1",
        "state": state,
        "source": {"file": "f1"},
        "destination": {"volume": "alice/bucket", "location": "harmonized/S1.bam"}
    }})
}

#[test]
fn test_export_files_dry_run_makes_no_request() {
    let mut cli = TestCli::new();
    let lookup = mock_file(&mut cli);
    let create = cli
        .server
        .mock("POST", "/bulk/storage/exports/create")
        .match_query(Matcher::Any)
        .expect(0)
        .create();
    let ids = cli.write("ids.txt", "f1\n");

    let (output, log) = cli.run_with_log([
        "export".to_owned(),
        "files".to_owned(),
        "--ids-file".to_owned(),
        ids.display().to_string(),
        "--volume".to_owned(),
        "alice/bucket".to_owned(),
    ]);

    lookup.assert();
    create.assert();
    assert!(output.is_empty());
    assert!(log.contains("DRY RUN"), "{log}");
}

#[test]
fn test_export_files_waits_for_completion() {
    let mut cli = TestCli::new();
    let _lookup = mock_file(&mut cli);
    let create = cli
        .server
        .mock("POST", "/bulk/storage/exports/create")
        .match_header("x-sbg-auth-token", TOKEN)
        .match_query(Matcher::UrlEncoded("copy_only".into(), "false".into()))
        .match_body(Matcher::Json(json!({
            "items": [{
                "source": {"file": "f1"},
                "destination": {"volume": "alice/bucket", "location": "harmonized/S1.bam"},
                "overwrite": true
            }]
        })))
        .with_body(json!({"items": [export("PENDING")]}).to_string())
        .expect(1)
        .create();
    let poll = cli
        .server
        .mock("POST", "/bulk/storage/exports/get")
        .match_body(Matcher::Json(json!({"export_ids": ["e1"]})))
        .with_body(json!({"items": [export("COMPLETED")]}).to_string())
        .expect(1)
        .create();
    let ids = cli.write("ids.txt", "f1\n");

    let (_, log) = cli.run_with_log([
        "export".to_owned(),
        "files".to_owned(),
        "--ids-file".to_owned(),
        ids.display().to_string(),
        "--volume".to_owned(),
        "alice/bucket".to_owned(),
        "--poll-interval".to_owned(),
        "0".to_owned(),
        "--run".to_owned(),
    ]);

    create.assert();
    poll.assert();
    assert!(
        log.contains("Exported 1 files to `alice/bucket/harmonized`."),
        "{log}"
    );
}
