mod common;

use common::{DkWorkspace, run_dk};
use serde_json::Value;
use std::fs;

#[test]
fn e2e_malformed_file_is_skipped_not_fatal() {
    let workspace = DkWorkspace::new();
    run_dk(&workspace, ["init"], "init");

    for n in 0..10 {
        let create = run_dk(&workspace, ["create", &format!("Issue {n}")], "create");
        assert!(create.status.success(), "create {n}: {}", create.stderr);
    }

    fs::write(
        workspace.docket_dir().join("issues/backlog/broken-deadbeef.md"),
        "this file has no metadata block\n",
    )
    .unwrap();

    let list = run_dk(&workspace, ["list", "--json"], "list");
    assert!(
        list.status.success(),
        "bulk listing must survive one bad file: {}",
        list.stderr
    );
    let records: Vec<Value> = serde_json::from_str(&list.stdout).expect("list json");
    assert_eq!(records.len(), 10, "exactly the valid issues are listed");
    assert!(
        list.stderr.contains("1 file(s) skipped"),
        "skip count missing: {}",
        list.stderr
    );
}

#[test]
fn e2e_fixed_file_reappears() {
    let workspace = DkWorkspace::new();
    run_dk(&workspace, ["init"], "init");

    run_dk(&workspace, ["create", "Good issue"], "create");

    let broken = workspace.docket_dir().join("issues/backlog/late-cafebabe.md");
    fs::write(&broken, "not yet valid\n").unwrap();

    let list = run_dk(&workspace, ["list", "--json"], "list_broken");
    let records: Vec<Value> = serde_json::from_str(&list.stdout).unwrap();
    assert_eq!(records.len(), 1);

    fs::write(
        &broken,
        "---\nid: cafebabe\ntitle: Late arrival\nstatus: todo\npriority: low\ncreated: 2026-01-01T00:00:00+00:00\nupdated: 2026-01-01T00:00:00+00:00\n---\n\nNow valid.\n",
    )
    .unwrap();

    let list = run_dk(&workspace, ["list", "--json"], "list_fixed");
    let records: Vec<Value> = serde_json::from_str(&list.stdout).unwrap();
    assert_eq!(records.len(), 2, "fixed file joins the listing");
}

#[test]
fn e2e_reindex_reports_and_succeeds() {
    let workspace = DkWorkspace::new();
    run_dk(&workspace, ["init"], "init");
    run_dk(&workspace, ["create", "An issue"], "create");

    fs::write(
        workspace.docket_dir().join("issues/backlog/bad-00000000.md"),
        "---\nid: 00000000\ntitle: No status\npriority: low\ncreated: x\nupdated: x\n---\n\n",
    )
    .unwrap();

    let reindex = run_dk(&workspace, ["reindex", "--force"], "reindex");
    assert!(reindex.status.success(), "reindex failed: {}", reindex.stderr);
    assert!(
        reindex.stdout.contains("skipped 1"),
        "stdout: {}",
        reindex.stdout
    );
}
