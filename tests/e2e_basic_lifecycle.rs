mod common;

use common::{DkWorkspace, parse_created_id, run_dk};
use serde_json::Value;

#[test]
fn e2e_basic_lifecycle() {
    let workspace = DkWorkspace::new();

    let init = run_dk(&workspace, ["init"], "init");
    assert!(init.status.success(), "init failed: {}", init.stderr);

    let create = run_dk(
        &workspace,
        ["create", "Test", "issue", "--priority", "high"],
        "create",
    );
    assert!(create.status.success(), "create failed: {}", create.stderr);
    let id = parse_created_id(&create.stdout);
    assert_eq!(id.len(), 8, "unexpected id: {id}");

    let update = run_dk(
        &workspace,
        [
            "update",
            id.as_str(),
            "--status",
            "in-progress",
            "--assignee",
            "alice",
        ],
        "update",
    );
    assert!(update.status.success(), "update failed: {}", update.stderr);

    let list = run_dk(&workspace, ["list", "--json"], "list");
    assert!(list.status.success(), "list failed: {}", list.stderr);
    let records: Vec<Value> = serde_json::from_str(&list.stdout).expect("list json");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], id.as_str());
    assert_eq!(records[0]["status"], "in-progress");
    assert_eq!(records[0]["assignee"], "alice");

    let show = run_dk(&workspace, ["show", id.as_str(), "--json"], "show");
    assert!(show.status.success(), "show failed: {}", show.stderr);
    let shown: Vec<Value> = serde_json::from_str(&show.stdout).expect("show json");
    assert_eq!(shown[0]["id"], id.as_str());
    assert_eq!(shown[0]["priority"], "high");

    let show_text = run_dk(&workspace, ["show", id.as_str()], "show_text");
    assert!(show_text.stdout.contains("Test issue"));

    let close = run_dk(&workspace, ["close", id.as_str()], "close");
    assert!(close.status.success(), "close failed: {}", close.stderr);

    let done = run_dk(&workspace, ["list", "--status", "done", "--json"], "done");
    let records: Vec<Value> = serde_json::from_str(&done.stdout).expect("done json");
    assert_eq!(records.len(), 1);
}

#[test]
fn e2e_version_flag() {
    assert_cmd::Command::cargo_bin("dk")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("0.1.0"));
}

#[test]
fn e2e_uninitialized_workspace_hints_at_init() {
    let workspace = DkWorkspace::new();
    let list = run_dk(&workspace, ["list"], "list");
    assert!(!list.status.success());
    assert!(list.stderr.contains("dk init"), "stderr: {}", list.stderr);
}

#[test]
fn e2e_show_unknown_id_fails() {
    let workspace = DkWorkspace::new();
    run_dk(&workspace, ["init"], "init");

    let show = run_dk(&workspace, ["show", "zzzzzzzz"], "show");
    assert!(!show.status.success());
    assert!(show.stderr.contains("not found"), "stderr: {}", show.stderr);
}

#[test]
fn e2e_id_prefix_resolution() {
    let workspace = DkWorkspace::new();
    run_dk(&workspace, ["init"], "init");

    let create = run_dk(&workspace, ["create", "Prefix", "target"], "create");
    let id = parse_created_id(&create.stdout);

    let prefix = &id[..4];
    let show = run_dk(&workspace, ["show", prefix, "--json"], "show_prefix");
    assert!(show.status.success(), "prefix lookup failed: {}", show.stderr);
    let shown: Vec<serde_json::Value> = serde_json::from_str(&show.stdout).unwrap();
    assert_eq!(shown[0]["id"], id.as_str());
}

#[test]
fn e2e_milestones_and_projects() {
    let workspace = DkWorkspace::new();
    run_dk(&workspace, ["init"], "init");

    let add = run_dk(
        &workspace,
        ["milestone", "add", "V1 Launch", "--due", "2027-03-01"],
        "milestone_add",
    );
    assert!(add.status.success(), "milestone add failed: {}", add.stderr);
    assert!(add.stdout.contains("v1-launch"), "name not normalized");

    let dup = run_dk(&workspace, ["milestone", "add", "v1 launch"], "dup");
    assert!(!dup.status.success(), "duplicate milestone must fail");

    let list = run_dk(&workspace, ["milestone", "list"], "milestone_list");
    assert!(list.stdout.contains("v1-launch"));
    assert!(list.stdout.contains("open"));

    let close = run_dk(&workspace, ["milestone", "close", "v1-launch"], "close");
    assert!(close.status.success(), "close failed: {}", close.stderr);

    let project = run_dk(&workspace, ["project", "add", "Payments"], "project_add");
    assert!(project.status.success());
    let projects = run_dk(&workspace, ["project", "list"], "project_list");
    assert!(projects.stdout.contains("Payments"));
    assert!(projects.stdout.contains("active"));
}
