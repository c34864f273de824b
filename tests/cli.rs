use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn wpsync_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("wpsync");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let posts = root.join("posts");
    let pages = root.join("pages");
    fs::create_dir_all(&posts).unwrap();
    fs::create_dir_all(&pages).unwrap();

    fs::write(
        posts.join("hello.md"),
        "---\ntitle: Hello\ndate: 2024-03-01\n---\nFirst post.",
    )
    .unwrap();
    fs::write(posts.join("second.md"), "---\ntitle: Second\n---\nMore.").unwrap();
    fs::write(pages.join("about.md"), "---\ntitle: About\nparent: 2\n---\nMe.").unwrap();

    // Port 9 is discard; a dry run must never connect.
    let config_content = format!(
        r#"[site]
url = "http://127.0.0.1:9"

[paths]
root = "{}"
"#,
        root.display()
    );

    let config_path = root.join("wpsync.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_wpsync(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = wpsync_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("WPSYNC_TOKEN")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run wpsync binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_dry_run_lists_new_files() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_wpsync(&config_path, &["sync", "--dry-run"]);
    assert!(success, "sync --dry-run failed: {}", stderr);
    assert!(stdout.contains("sync posts (dry-run)"));
    assert!(stdout.contains("    + hello.md"));
    assert!(stdout.contains("    + second.md"));
    assert!(stdout.contains("sync pages (dry-run)"));
    assert!(stdout.contains("    + about.md"));
    assert!(stdout.trim_end().ends_with("ok"));

    assert!(!tmp.path().join("posts.json").exists());
    assert!(!tmp.path().join("pages.json").exists());
}

#[test]
fn test_dry_run_reports_stale_from_manifest() {
    let (tmp, config_path) = setup_test_env();

    fs::write(
        tmp.path().join("posts.json"),
        r#"[
  {"LocalFile": "hello.md", "id": 5, "link": "https://blog.test/?p=5", "SyncDate": "2000-01-01T00:00:00Z"},
  {"filename": "second.md", "id": 6, "synced_at": "2999-01-01T00:00:00Z"}
]"#,
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_wpsync(&config_path, &["sync", "--dry-run", "--only", "posts"]);
    assert!(success, "sync failed: {}", stderr);
    assert!(stdout.contains("  new: 0"));
    assert!(stdout.contains("    ~ hello.md"));
    assert!(stdout.contains("  unchanged: 1"));
    assert!(!stdout.contains("sync pages"));
}

#[test]
fn test_only_rejects_unknown_collection() {
    let (_tmp, config_path) = setup_test_env();
    let (_stdout, stderr, success) =
        run_wpsync(&config_path, &["sync", "--dry-run", "--only", "comments"]);
    assert!(!success);
    assert!(stderr.contains("Unknown collection"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (_stdout, stderr, success) = run_wpsync(&missing, &["sync", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("wpsync init"));
}

#[test]
fn test_check_without_token_fails() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_wpsync(&config_path, &["check"]);
    assert!(!success);
    assert!(stdout.contains("Test setup failed."));
    assert!(stderr.contains("token not set"));
}

#[test]
fn test_sync_without_token_sends_nothing() {
    let (tmp, config_path) = setup_test_env();
    let (_stdout, stderr, success) = run_wpsync(&config_path, &["sync"]);
    assert!(!success);
    assert!(stderr.contains("token not set"));
    assert!(!tmp.path().join("posts.json").exists());
}
