mod support;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use support::{sample_tasks, Workspace};

fn mpdx_filter(workspace: &Workspace) -> Command {
    let mut cmd = Command::cargo_bin("mpdx-filter").expect("binary");
    cmd.current_dir(workspace.path())
        .env_remove("MPDX_FILTER_CONFIG")
        .env_remove("MPDX_ACCOUNT_LIST_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn json_data(output: &[u8]) -> Value {
    let envelope: Value = serde_json::from_slice(output).expect("json envelope");
    assert_eq!(envelope["schema_version"], "mpdx-filter.v1");
    envelope["data"].clone()
}

#[test]
fn help_works() {
    let workspace = Workspace::new();
    mpdx_filter(&workspace)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Task-list filter codec"));
}

#[test]
fn subcommand_help_works() {
    let workspace = Workspace::new();
    for cmd in ["decode", "encode", "vars", "list"] {
        mpdx_filter(&workspace)
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn decode_json_reports_filter() {
    let workspace = Workspace::new();
    let output = mpdx_filter(&workspace)
        .args(["decode", "/tasks?completed=true&tags[]=urgent&bogus=1", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let data = json_data(&output.stdout);
    assert_eq!(data["view"], "tasks");
    assert_eq!(data["filter"]["completed"], true);
    assert_eq!(data["filter"]["tags"][0], "urgent");
    assert!(data["filter"].get("bogus").is_none());
}

#[test]
fn decode_json_reports_dropped_keys_as_notices() {
    let workspace = Workspace::new();
    let output = mpdx_filter(&workspace)
        .args(["decode", "/tasks?bogus=1&userIds[x]=1&tags[]=a", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
    let notices = envelope["notices"].as_array().expect("notices");
    let kinds: Vec<(&str, &str)> = notices
        .iter()
        .map(|notice| {
            (
                notice["kind"].as_str().unwrap_or_default(),
                notice["field"].as_str().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(
        kinds,
        vec![("ignored_key", "bogus"), ("malformed_field", "userIds")]
    );
}

#[test]
fn decode_human_prints_warnings() {
    let workspace = Workspace::new();
    mpdx_filter(&workspace)
        .args(["decode", "/tasks?bogus=1"])
        .assert()
        .success()
        .stdout(contains("warning: bogus: not a filter for this view"));
}

#[test]
fn decode_without_query_is_null_filter() {
    let workspace = Workspace::new();
    let output = mpdx_filter(&workspace)
        .args(["decode", "/tasks", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    assert!(json_data(&output.stdout)["filter"].is_null());
}

#[test]
fn encode_prints_shareable_path() {
    let workspace = Workspace::new();
    mpdx_filter(&workspace)
        .args(["encode", r#"{"tags":["a"],"completed":true}"#])
        .assert()
        .success()
        .stdout(contains("/tasks?completed=true&tags%5B%5D=a"));
}

#[test]
fn encode_rejects_invalid_json() {
    let workspace = Workspace::new();
    mpdx_filter(&workspace)
        .args(["encode", "{not json"])
        .assert()
        .code(4);
}

#[test]
fn vars_requires_account_list_id() {
    let workspace = Workspace::new();
    mpdx_filter(&workspace)
        .args(["vars", "/tasks?completed=true"])
        .assert()
        .code(2)
        .stderr(contains("account list id required"));
}

#[test]
fn vars_reads_account_list_id_from_config() {
    let workspace = Workspace::new();
    workspace.write_config(
        r#"
account_list_id = "acct-9"

[tasks]
rows_per_page = 25
"#,
    );
    let output = mpdx_filter(&workspace)
        .args(["vars", "/tasks?tags[]=urgent", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let data = json_data(&output.stdout);
    assert_eq!(data["accountListId"], "acct-9");
    assert_eq!(data["first"], 25);
    assert_eq!(data["tags"][0], "urgent");
    assert!(data["after"].is_null());
}

#[test]
fn missing_explicit_config_is_user_error() {
    let workspace = Workspace::new();
    mpdx_filter(&workspace)
        .args(["--config", "nope.toml", "decode", "/tasks"])
        .assert()
        .code(2);
}

#[test]
fn list_pages_through_local_tasks() {
    let workspace = Workspace::new();
    let tasks = workspace.write_tasks(&sample_tasks());
    let tasks = tasks.to_str().expect("utf8 path");

    let output = mpdx_filter(&workspace)
        .args(["list", "/tasks?tags[]=urgent", "--tasks", tasks, "--first", "2", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let data = json_data(&output.stdout);
    assert_eq!(data["totalCount"], 5);
    assert_eq!(data["rows"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["pageInfo"]["hasNextPage"], true);
    assert_eq!(data["sharePath"], "/tasks?tags%5B%5D=urgent");
    let cursor = data["pageInfo"]["endCursor"]
        .as_str()
        .expect("end cursor")
        .to_string();

    let output = mpdx_filter(&workspace)
        .args([
            "list",
            "/tasks?tags[]=urgent",
            "--tasks",
            tasks,
            "--first",
            "2",
            "--after",
            &cursor,
            "--json",
        ])
        .output()
        .expect("run");
    assert!(output.status.success());

    let data = json_data(&output.stdout);
    assert_eq!(data["rows"][0]["id"], "t4");
    assert_eq!(data["variables"]["after"], cursor.as_str());
}

#[test]
fn list_applies_column_and_search_flags() {
    let workspace = Workspace::new();
    let tasks = workspace.write_tasks(&sample_tasks());

    let output = mpdx_filter(&workspace)
        .arg("list")
        .arg("/tasks")
        .arg("--tasks")
        .arg(&tasks)
        .args(["--column", "completedAt=true", "--search", "thank", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let data = json_data(&output.stdout);
    assert_eq!(data["totalCount"], 2);
    assert_eq!(data["variables"]["wildcardSearch"], "thank");
}

#[test]
fn list_rejects_bad_cursor() {
    let workspace = Workspace::new();
    let tasks = workspace.write_tasks(&sample_tasks());

    mpdx_filter(&workspace)
        .arg("list")
        .arg("/tasks")
        .arg("--tasks")
        .arg(&tasks)
        .args(["--after", "page-two"])
        .assert()
        .code(4)
        .stderr(contains("invalid cursor"));
}
