use std::path::PathBuf;
use std::process::Command;

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "nightreign-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn data_arg(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../data")
        .join(relative)
}

fn planner(layout: &str) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_nightreign-planner"));
    command
        .arg("--layout")
        .arg(data_arg(layout))
        .arg("--locations")
        .arg(data_arg("locations.json"))
        .arg("--coordinates")
        .arg(data_arg("coordinates.json"));
    command
}

#[test]
fn cli_writes_json_route_report() {
    let output_path = temp_path("route.json");
    let status = planner("layouts/gladius-01.json")
        .args(["--report", "json", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(value["mode"], "route");
    assert_eq!(value["success"], true);
    assert_eq!(value["route"]["route"], serde_json::json!([157, 96, 84, 106]));
}

#[test]
fn cli_writes_markdown_expedition_report() {
    let output_path = temp_path("expedition.md");
    let status = planner("layouts/gladius-01.json")
        .args([
            "--mode",
            "expedition",
            "--team",
            "wylder:key,guardian",
            "--report",
            "markdown",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("# Nightreign Route Plan"));
    assert!(content.contains("## Day 1"));
    assert!(content.contains("## Day 2"));
}

#[test]
fn cli_exits_non_zero_when_anchors_are_missing() {
    let output_path = temp_path("broken.json");
    let output = planner("layouts/broken-anchors.json")
        .args(["--mode", "expedition", "--report", "json", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(1));
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Missing required start/end POIs from layout data"));
}

#[test]
fn cli_step_mode_prints_console_steps() {
    let output = planner("layouts/gladius-01.json")
        .args(["--mode", "step", "--steps", "2", "--nightlord", "libra"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Nightreign Route Planner"));
    assert!(stdout.contains("step 1: POI 157"));
    assert!(stdout.contains("step 2: POI 96"));
}

#[test]
fn cli_rejects_unknown_team_class() {
    let output = planner("layouts/gladius-01.json")
        .args(["--team", "tarnished", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tarnished"));
}
