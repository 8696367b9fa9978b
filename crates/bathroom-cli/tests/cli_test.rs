//! Integration tests for the bathroom binary
//!
//! Each test runs the binary inside its own temporary directory, with the
//! cache and device store redirected there and no remote store configured.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bathroom(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bathroom"))
        .args(args)
        .current_dir(dir)
        .env("BATHROOM_CACHE_PATH", dir.join("cache.db"))
        .env("BATHROOM_DEVICE_STORE_PATH", dir.join("device.json"))
        .env_remove("BATHROOM_FIRESTORE_PROJECT")
        .env_remove("BATHROOM_FIRESTORE_API_KEY")
        .env_remove("BATHROOM_FRESHNESS_HOURS")
        .env_remove("BATHROOM_MAX_SPAN_DEGREES")
        .env_remove("BATHROOM_DEBOUNCE_MS")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute command")
}

fn json_data(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");
    parsed["data"].clone()
}

#[test]
fn test_config_json_reports_sources() {
    let dir = TempDir::new().unwrap();
    let output = bathroom(dir.path(), &["config", "--json", "--freshness-hours", "12"]);
    assert!(output.status.success());

    let rows = json_data(&output);
    let rows = rows.as_array().expect("config rows");
    let row = |key: &str| rows.iter().find(|r| r["key"] == key).cloned().expect(key);

    assert_eq!(row("freshness_hours")["value"], "12");
    assert_eq!(row("freshness_hours")["source"], "Cli");
    assert_eq!(row("cache_path")["source"], "Environment");
    assert_eq!(row("debounce_ms")["source"], "Default");
}

#[test]
fn test_config_file_is_picked_up_from_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bathroom.toml"), "max_span_degrees = 0.5\n").unwrap();

    let output = bathroom(dir.path(), &["config", "--json"]);
    assert!(output.status.success());

    let rows = json_data(&output);
    let row = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["key"] == "max_span_degrees")
        .cloned()
        .unwrap();
    assert_eq!(row["value"], "0.5");
    assert_eq!(row["source"], "File");
}

#[test]
fn test_missing_explicit_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = bathroom(dir.path(), &["config", "--config", "absent.toml"]);
    assert!(!output.status.success());
}

#[test]
fn test_device_id_is_stable_across_runs() {
    let dir = TempDir::new().unwrap();

    let first = json_data(&bathroom(dir.path(), &["device-id", "--json"]));
    let second = json_data(&bathroom(dir.path(), &["device-id", "--json"]));

    let id = first["device_id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(first["device_id"], second["device_id"]);
    assert!(dir.path().join("device.json").exists());
}

#[test]
fn test_list_on_empty_cache() {
    let dir = TempDir::new().unwrap();
    let output = bathroom(dir.path(), &["list", "--json"]);
    assert!(output.status.success());

    let data = json_data(&output);
    assert_eq!(data["count"], 0);
    assert_eq!(data["toilets"].as_array().unwrap().len(), 0);
}

#[test]
fn test_add_without_remote_store_fails() {
    let dir = TempDir::new().unwrap();
    let output = bathroom(
        dir.path(),
        &["add", "--lat", "40.7128", "--lng", "-74.0060", "--status", "open"],
    );
    assert!(!output.status.success());

    // Nothing provisional is left behind
    let list = json_data(&bathroom(dir.path(), &["list", "--json"]));
    assert_eq!(list["count"], 0);
}

#[test]
fn test_report_rejects_unknown_status() {
    let dir = TempDir::new().unwrap();
    let output = bathroom(
        dir.path(),
        &["report", "node/1", "--status", "flooded", "--lat", "1", "--lng", "1"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("flooded"));
}

#[test]
fn test_nearest_without_location_warns() {
    let dir = TempDir::new().unwrap();
    let output = bathroom(dir.path(), &["nearest", "--json"]);
    assert!(output.status.success());

    let data = json_data(&output);
    assert!(data["toilet"].is_null());
    assert!(String::from_utf8_lossy(&output.stderr).contains("warning"));
}

#[test]
fn test_directions_for_unknown_restroom_fails() {
    let dir = TempDir::new().unwrap();
    let output = bathroom(dir.path(), &["directions", "node/404"]);
    assert!(!output.status.success());
}
