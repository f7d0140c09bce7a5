use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

#[path = "support/pdf.rs"]
mod pdf;

use pdf::pdf_with_pages;

fn paperchat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("paperchat");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let papers = root.join("papers");
    fs::create_dir_all(&papers).unwrap();
    fs::write(
        papers.join("networks.pdf"),
        pdf_with_pages(&[
            "Neural networks are powerful function approximators.",
            "Backpropagation computes gradients layer by layer.",
        ]),
    )
    .unwrap();
    fs::write(
        papers.join("kitchen.pdf"),
        pdf_with_pages(&["Sourdough bread needs a mature starter and patience."]),
    )
    .unwrap();
    fs::write(root.join("scan.pdf"), pdf_with_pages(&[""])).unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    // Port 9 (discard) is never served, so generation fails fast.
    let config_content = format!(
        r#"[index]
persist_directory = "{}/index"

[chunking]
chunk_size = 80
chunk_overlap = 20

[retrieval]
k = 2

[embedding]
provider = "hash"

[answer]
url = "http://127.0.0.1:9"
max_retries = 0
timeout_secs = 5
"#,
        root.display()
    );

    let config_path = config_dir.join("paperchat.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_paperchat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = paperchat_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run paperchat binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn papers_dir(config_path: &Path) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("papers")
        .display()
        .to_string()
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config) = setup_test_env();

    let (stdout, stderr, ok) = run_paperchat(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Index initialized"));

    let (_, stderr, ok) = run_paperchat(&config, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn test_ingest_then_reingest_skips() {
    let (_tmp, config) = setup_test_env();
    let papers = papers_dir(&config);

    let (stdout, stderr, ok) = run_paperchat(&config, &["ingest", &papers]);
    assert!(ok, "ingest failed: {}", stderr);
    assert!(stdout.contains("processed: kitchen.pdf"));
    assert!(stdout.contains("processed: networks.pdf"));
    assert!(stdout.contains("Processed 2 new documents!"));

    let (stdout, stderr, ok) = run_paperchat(&config, &["ingest", &papers]);
    assert!(ok, "re-ingest failed: {}", stderr);
    assert!(stdout.contains("skipped (already processed): networks.pdf"));
    assert!(stdout.contains("No new documents to process."));

    let (stdout, _, ok) = run_paperchat(&config, &["documents"]);
    assert!(ok);
    assert!(stdout.contains("Documents:   2"));
    assert!(stdout.contains("networks.pdf"));
}

#[test]
fn test_image_only_pdf_is_reported_not_fatal() {
    let (tmp, config) = setup_test_env();
    let scan = tmp.path().join("scan.pdf").display().to_string();
    let papers = papers_dir(&config);

    let (stdout, stderr, ok) = run_paperchat(&config, &["ingest", &scan, &papers]);
    assert!(ok, "ingest failed: {}", stderr);
    assert!(stdout.contains("failed: scan.pdf"));
    assert!(stdout.contains("Processed 2 new documents!"));
}

#[test]
fn test_search_ranks_matching_document_first() {
    let (_tmp, config) = setup_test_env();
    let papers = papers_dir(&config);
    let (_, stderr, ok) = run_paperchat(&config, &["ingest", &papers]);
    assert!(ok, "ingest failed: {}", stderr);

    let (stdout, stderr, ok) = run_paperchat(&config, &["search", "sourdough starter bread"]);
    assert!(ok, "search failed: {}", stderr);
    let first = stdout.lines().next().unwrap_or_default();
    assert!(first.starts_with("1. "), "unexpected output: {}", stdout);
    assert!(first.contains("kitchen.pdf"), "unexpected output: {}", stdout);

    let (stdout, _, ok) = run_paperchat(&config, &["search", "neural", "--k", "1", "--json"]);
    assert!(ok);
    let hits: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(hits.as_array().unwrap().len(), 1);
}

#[test]
fn test_search_before_ingest_is_refused() {
    let (_tmp, config) = setup_test_env();

    let (_, stderr, ok) = run_paperchat(&config, &["search", "anything"]);
    assert!(!ok);
    assert!(stderr.contains("upload and process at least one PDF"));
}

#[test]
fn test_clear_removes_everything() {
    let (_tmp, config) = setup_test_env();
    let papers = papers_dir(&config);
    let (_, stderr, ok) = run_paperchat(&config, &["ingest", &papers]);
    assert!(ok, "ingest failed: {}", stderr);

    let (stdout, stderr, ok) = run_paperchat(&config, &["clear"]);
    assert!(ok, "clear failed: {}", stderr);
    assert!(stdout.contains("All data cleared."));

    let (_, stderr, ok) = run_paperchat(&config, &["search", "neural"]);
    assert!(!ok);
    assert!(stderr.contains("upload and process at least one PDF"));

    // Same documents are accepted again after a clear.
    let (stdout, _, ok) = run_paperchat(&config, &["ingest", &papers]);
    assert!(ok);
    assert!(stdout.contains("Processed 2 new documents!"));
}

#[test]
fn test_ask_without_llm_fails_and_keeps_index() {
    let (_tmp, config) = setup_test_env();
    let papers = papers_dir(&config);
    let (_, stderr, ok) = run_paperchat(&config, &["ingest", &papers]);
    assert!(ok, "ingest failed: {}", stderr);

    let (_, stderr, ok) = run_paperchat(&config, &["ask", "What are neural networks?"]);
    assert!(!ok);
    assert!(stderr.contains("Error generating response"), "stderr: {}", stderr);

    let (stdout, _, ok) = run_paperchat(&config, &["search", "neural networks"]);
    assert!(ok);
    assert!(stdout.contains("networks.pdf"));
}

#[test]
fn test_ask_rejects_unknown_model() {
    let (_tmp, config) = setup_test_env();
    let papers = papers_dir(&config);
    run_paperchat(&config, &["ingest", &papers]);

    let (_, stderr, ok) = run_paperchat(&config, &["ask", "hi", "--model", "gpt-17"]);
    assert!(!ok);
    assert!(stderr.contains("gpt-17"));
}

#[test]
fn test_models_marks_configured() {
    let (_tmp, config) = setup_test_env();

    let (stdout, _, ok) = run_paperchat(&config, &["models"]);
    assert!(ok);
    assert!(stdout.contains("* llama3"));
    assert!(stdout.contains("  mistral"));
}

#[test]
fn test_explicit_missing_config_is_error() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_paperchat(&tmp.path().join("nope.toml"), &["models"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_clear_recovers_unreadable_index() {
    let (tmp, config) = setup_test_env();
    let index_dir = tmp.path().join("index");
    fs::create_dir_all(&index_dir).unwrap();
    fs::write(index_dir.join("index.sqlite"), b"garbage, not a sqlite file").unwrap();

    let (_, _, ok) = run_paperchat(&config, &["documents"]);
    assert!(!ok);

    let (stdout, stderr, ok) = run_paperchat(&config, &["clear"]);
    assert!(ok, "clear failed: {}", stderr);
    assert!(stdout.contains("All data cleared."));

    let (stdout, _, ok) = run_paperchat(&config, &["documents"]);
    assert!(ok);
    assert!(stdout.contains("Documents:   0"));
}
