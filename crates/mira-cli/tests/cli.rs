use assert_cmd::Command;
use predicates::str::{contains, starts_with};
use tempfile::{TempDir, tempdir};

fn mira(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mira"));
    cmd.env("MIRA_DIR", temp_dir.path())
        .env("MIRA_CONFIG", temp_dir.path().join("config.toml"))
        .env_remove("MIRA_DB_PATH")
        .env_remove("RUST_LOG");
    cmd
}

fn remember_id(temp_dir: &TempDir, owner: &str, content: &str) -> String {
    let output = mira(temp_dir)
        .args(["--format", "json", "remember", owner, content])
        .output()
        .unwrap();
    assert!(output.status.success());
    let memory: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    memory["id"].as_str().unwrap().to_string()
}

#[test]
fn test_cli_help() {
    let temp_dir = tempdir().unwrap();
    mira(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("MIRA"));
}

#[test]
fn test_cli_version() {
    let temp_dir = tempdir().unwrap();
    mira(&temp_dir).arg("--version").assert().success();
}

#[test]
fn test_cli_completions() {
    let temp_dir = tempdir().unwrap();
    mira(&temp_dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_mira"));
}

#[test]
fn test_remember_then_recall() {
    let temp_dir = tempdir().unwrap();
    let id = remember_id(&temp_dir, "u1", "Sam is allergic to peanuts");

    mira(&temp_dir)
        .args(["--format", "json", "recall", "u1", "peanuts"])
        .assert()
        .success()
        .stdout(contains(id.as_str()));

    mira(&temp_dir)
        .args(["recall", "u2", "peanuts"])
        .assert()
        .success()
        .stdout(contains("No memories found."));
}

#[test]
fn test_forget_missing_memory_fails() {
    let temp_dir = tempdir().unwrap();
    mira(&temp_dir)
        .args(["forget", "mem-missing"])
        .assert()
        .failure()
        .stderr(contains("Memory not found"));
}

#[test]
fn test_forget_removes_memory() {
    let temp_dir = tempdir().unwrap();
    let id = remember_id(&temp_dir, "u1", "parked on level 3");

    mira(&temp_dir).args(["forget", &id]).assert().success();
    mira(&temp_dir)
        .args(["show", &id])
        .assert()
        .failure()
        .stderr(contains("Memory not found"));
}

#[test]
fn test_invalid_memory_type_is_rejected() {
    let temp_dir = tempdir().unwrap();
    mira(&temp_dir)
        .args(["remember", "u1", "something", "--type", "dreamy"])
        .assert()
        .failure()
        .stderr(contains("Unknown memory type"));
}

#[test]
fn test_link_and_list_links() {
    let temp_dir = tempdir().unwrap();
    let a = remember_id(&temp_dir, "u1", "missed the train");
    let b = remember_id(&temp_dir, "u1", "late for the meeting");

    mira(&temp_dir)
        .args(["link", &a, &b, "--type", "leads-to", "--strength", "0.8"])
        .assert()
        .success()
        .stdout(contains("leads_to"));

    mira(&temp_dir)
        .args(["--format", "json", "links", &b])
        .assert()
        .success()
        .stdout(contains(a.as_str()));
}

#[test]
fn test_doc_set_list_delete() {
    let temp_dir = tempdir().unwrap();
    let output = mira(&temp_dir)
        .args(["--format", "json", "doc", "set", "u1", "Preferences", "Likes window seats"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = doc["id"].as_str().unwrap().to_string();

    mira(&temp_dir)
        .args(["doc", "list", "u1"])
        .assert()
        .success()
        .stdout(contains("Preferences"));

    mira(&temp_dir).args(["doc", "delete", &id]).assert().success();
    mira(&temp_dir)
        .args(["doc", "list", "u1"])
        .assert()
        .success()
        .stdout(contains("No documents."));
}

#[test]
fn test_chat_activates_tools_and_consolidates() {
    let temp_dir = tempdir().unwrap();
    mira(&temp_dir)
        .args(["chat", "u1"])
        .write_stdin("what's the weather forecast\nassistant(weather): sunny all day\n")
        .assert()
        .success()
        .stdout(contains("+ tools:"))
        .stdout(contains("- user: what's the weather forecast"))
        .stdout(contains("- weather: "))
        .stdout(contains("Consolidated conversation into"));

    mira(&temp_dir)
        .args(["--format", "json", "stats", "u1"])
        .assert()
        .success()
        .stdout(contains("\"semantic\": 1"));
}

#[test]
fn test_sleep_reports_cycle() {
    let temp_dir = tempdir().unwrap();
    remember_id(&temp_dir, "u1", "bought a new bike");

    mira(&temp_dir)
        .arg("sleep")
        .assert()
        .success()
        .stdout(contains("Sleep cycle finished"));
}

#[test]
fn test_malformed_config_is_reported() {
    let temp_dir = tempdir().unwrap();
    std::fs::write(temp_dir.path().join("config.toml"), "[decay\nbroken").unwrap();

    mira(&temp_dir)
        .args(["stats", "u1"])
        .assert()
        .failure()
        .stderr(contains("Invalid configuration"));
}
