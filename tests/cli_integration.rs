use serde_json::{json, Value};
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn run_jf(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_jf"))
        .args(args)
        .env_remove("JFUNC_FUNCTIONS")
        .env_remove("JFUNC_REQUIRE_WHITELIST")
        .env_remove("JFUNC_SHUTDOWN_ON_ERROR")
        .output()
        .expect("failed to run jf");
    (
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_call_with_json_document() {
    let (stdout, _, code) = run_jf(&["--call", "countArray(array)", "--json", r#"{"array": [1, 2, 3]}"#]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "3");
}

#[test]
fn test_call_output_json() {
    let (stdout, _, code) = run_jf(&[
        "--call",
        "getFromArray(array,@position)",
        "--json",
        r#"{"array": [5, 6], "position": 1}"#,
        "--output-json",
    ]);
    assert_eq!(code, 0);
    let output: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(output["result"], json!(6));
    assert_eq!(output["type"], json!("Integer"));
}

#[test]
fn test_call_error_exit_code() {
    let (_, stderr, code) = run_jf(&["--call", "nope(a)"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Unknown function"));
}

#[test]
fn test_document_run() {
    let (stdout, _, code) = run_jf(&[r#"{"array": [1, 2], "size()": "countArray(array)"}"#]);
    assert_eq!(code, 0);
    let response: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["code"], json!(200));
    assert_eq!(response["size"], json!(2));
}

#[test]
fn test_self_check() {
    let (stdout, _, code) = run_jf(&["--self-check"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("passed"));
}

#[test]
fn test_strict_run_with_loaded_functions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("functions.json");
    fs::write(
        &path,
        r#"[{"name": "isContain", "arguments": "array,id", "methods": "GET", "demo": "{\"array\": [1], \"id\": 1}"}]"#,
    )
    .unwrap();
    let path = path.to_str().unwrap();
    let doc = r#"{"id": 1, "array": [1], "ok()": "isContain(array,id)"}"#;

    let (stdout, stderr, code) = run_jf(&[doc, "--functions", path, "--strict"]);
    assert_eq!(code, 0, "{}", stderr);
    let response: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["ok"], json!(true));

    let (stdout, _, code) = run_jf(&[doc, "--functions", path, "--strict", "--method", "POST"]);
    assert_eq!(code, 2);
    let response: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["code"], json!(403));
}

#[test]
fn test_usage_without_arguments() {
    let (_, stderr, code) = run_jf(&[]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Usage"));
}
