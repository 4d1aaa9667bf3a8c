//! CLI integration tests for skillgraph
//!
//! Tests the skillgraph CLI commands end-to-end using assert_cmd. Every test
//! gets its own database and config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("graph.db")
    }

    fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Command bound to this workspace's database and config
    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("skillgraph").unwrap();
        cmd.env("SKILLGRAPH_CONFIG_DIR", self.config_dir());
        cmd.env_remove("RUST_LOG");
        cmd.arg("--db").arg(self.db());
        cmd
    }

    fn issue_created(&self, number: u64, json: &str) {
        let data = self.write(&format!("issue-{}.json", number), json);
        self.cmd()
            .args(["issue", "created", &number.to_string(), "--data"])
            .arg(&data)
            .assert()
            .success();
    }

    fn pr_created(&self, number: u64, json: &str) {
        let data = self.write(&format!("pr-{}.json", number), json);
        self.cmd()
            .args(["pr", "created", &number.to_string(), "--data"])
            .arg(&data)
            .assert()
            .success();
    }
}

const ISSUE_JSON: &str = r#"{
    "title": "Storage API token expired",
    "body": "Following docs/keboola/auth.md fails",
    "labels": [{"name": "bug"}],
    "html_url": "https://github.com/acme/docs/issues/42"
}"#;

const PR_JSON: &str = r#"{
    "title": "Refresh auth docs",
    "body": "Fixes #42",
    "changed_files": ["docs/keboola/auth.md"],
    "additions": 12,
    "deletions": 3
}"#;

#[test]
fn test_help_lists_commands() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("issue"))
        .stdout(predicate::str::contains("dependents"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_issue_created_reports_links() {
    let ws = Workspace::new();
    let data = ws.write("issue.json", ISSUE_JSON);

    ws.cmd()
        .args(["issue", "created", "42", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Upserted node: Issue:42"))
        .stdout(predicate::str::contains(
            "Linked Issue:42 --ABOUT--> Concept:StorageAPI",
        ))
        .stdout(predicate::str::contains(
            "Linked Issue:42 --ABOUT--> Document:docs/keboola/auth.md",
        ));
}

#[test]
fn test_issue_created_from_stdin() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["issue", "created", "5", "--data", "-"])
        .write_stdin(r#"{"title": "Flow stuck"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Concept:Flows"));
}

#[test]
fn test_issue_created_rejects_missing_title() {
    let ws = Workspace::new();
    let data = ws.write("bad.json", r#"{"body": "no title"}"#);

    ws.cmd()
        .args(["issue", "created", "1", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E100"));
}

#[test]
fn test_closing_unknown_issue_fails_with_hint() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["issue", "closed", "404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E001"))
        .stderr(predicate::str::contains("skillgraph issue created 404"));
}

#[test]
fn test_full_lifecycle() {
    let ws = Workspace::new();
    ws.issue_created(42, ISSUE_JSON);
    ws.pr_created(43, PR_JSON);

    ws.cmd()
        .args(["related", "PullRequest:43", "--relationship", "FIXED_BY"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Issue:42"));

    ws.cmd()
        .args(["pr", "merged", "43"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Closed issues: Issue:42"));

    ws.cmd()
        .args(["list", "issues"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Issue #42 [closed]"));

    ws.cmd()
        .args(["list", "prs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PR #43 [merged]"));
}

#[test]
fn test_stats_json() {
    let ws = Workspace::new();
    ws.issue_created(42, ISSUE_JSON);

    let output = ws
        .cmd()
        .args(["stats", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stats: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(stats["total_nodes"], 4);
    assert_eq!(stats["total_edges"], 3);
    assert_eq!(stats["nodes_by_type"]["Issue"], 1);
}

#[test]
fn test_show_node() {
    let ws = Workspace::new();
    ws.issue_created(42, ISSUE_JSON);

    ws.cmd()
        .args(["show", "Issue:42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Issue: Issue #42"))
        .stdout(predicate::str::contains("\"Storage API token expired\""))
        .stdout(predicate::str::contains("Issue:42 --ABOUT--> Concept:Authentication"));

    ws.cmd()
        .args(["show", "Issue:7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E001"));
}

#[test]
fn test_dependents_honours_depth() {
    let ws = Workspace::new();
    ws.pr_created(
        1,
        r#"{"title": "Docs", "changed_files": [{"filename": "docs/a.md"}]}"#,
    );

    ws.cmd()
        .args(["dependents", "PullRequest:1", "--depth", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Document:docs/a.md"));

    ws.cmd()
        .args(["dependents", "PullRequest:1", "--depth", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependents"));
}

#[test]
fn test_unknown_list_type_is_rejected() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["list", "widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown node type"));
}

#[test]
fn test_export_jsonl_and_snapshot() {
    let ws = Workspace::new();
    ws.issue_created(42, ISSUE_JSON);

    let export_dir = ws.path().join("export");
    ws.cmd()
        .args(["export", "--output"])
        .arg(&export_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 nodes and 3 edges"));
    assert!(export_dir.join("nodes.jsonl").exists());
    assert!(export_dir.join("edges.jsonl").exists());
    assert!(export_dir.join("_metadata.json").exists());

    let snapshot = ws.path().join("graph.json");
    ws.cmd()
        .args(["export", "--snapshot", "--output"])
        .arg(&snapshot)
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(json["metadata"]["node_count"], 4);
    assert_eq!(json["metadata"]["version"], "1.0");
}

#[test]
fn test_quiet_mode_suppresses_output() {
    let ws = Workspace::new();
    let data = ws.write("issue.json", ISSUE_JSON);

    ws.cmd()
        .args(["--quiet", "issue", "created", "42", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_config_set_get_and_reset() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["config", "set", "traversal.default_max_depth", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set traversal.default_max_depth = 5"));

    ws.cmd()
        .args(["config", "get", "traversal.default_max_depth"])
        .assert()
        .success()
        .stdout(predicate::str::diff("5\n"));

    ws.cmd()
        .args(["config", "set", "traversal.default_max_depth", "0"])
        .assert()
        .failure();

    ws.cmd().args(["config", "reset"]).assert().success();

    ws.cmd()
        .args(["config", "get", "traversal.default_max_depth"])
        .assert()
        .success()
        .stdout(predicate::str::diff("3\n"));
}

#[test]
fn test_doctor_reports_schema() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Database: Schema v1"));
}

#[test]
fn test_invalid_extraction_rules_fail_before_opening_database() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.config_dir()).unwrap();
    std::fs::write(
        ws.config_dir().join("config.toml"),
        "[extraction]\ndocument_pattern = \"(\"\n",
    )
    .unwrap();
    let data = ws.write("issue.json", ISSUE_JSON);

    ws.cmd()
        .args(["issue", "created", "42", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("extraction"));

    assert!(!ws.db().exists(), "database must not be opened");
}
