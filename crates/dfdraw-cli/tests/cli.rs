//! End-to-end tests for the dfdraw binary

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

const SAMPLE: &str = r#"{
    "externalEntities": [{"id": "E", "name": "Customer"}],
    "processes": [{"id": "P1", "number": "1", "name": "Checkout", "x": 400, "y": 400}],
    "dataStores": [{"id": "S1", "name": "Orders", "prefix": "D1"}],
    "dataFlows": [
        {"id": "F1", "sourceId": "E", "targetId": "P1", "label": "Order", "protocol": "https"},
        {"id": "F2", "sourceId": "P1", "targetId": "S1", "label": "Save", "protocol": "sql"}
    ]
}"#;

fn dfdraw(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_dfdraw"))
        .args(args)
        .env_remove("DFDRAW_LOG_LEVEL")
        .env_remove("DFDRAW_LOG_FORMAT")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("binary should start");
    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(text) = stdin {
            pipe.write_all(text.as_bytes()).unwrap();
        }
    }
    child.wait_with_output().unwrap()
}

fn write_sample(dir: &Path) -> String {
    let path = dir.join("diagram.json");
    fs::write(&path, SAMPLE).unwrap();
    path.to_string_lossy().into_owned()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_render_svg_from_stdin() {
    let output = dfdraw(&["render"], Some(SAMPLE));
    assert!(output.status.success());
    let svg = String::from_utf8(output.stdout).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Checkout"));
    assert!(svg.contains("arrow-end-sql"));
}

#[test]
fn test_render_png_to_file() {
    let dir = tempdir().unwrap();
    let input = write_sample(dir.path());
    let png = dir.path().join("diagram.png");
    let output = dfdraw(
        &["render", "-i", &input, "-o", png.to_str().unwrap(), "-f", "png", "--scale", "1"],
        None,
    );
    assert!(output.status.success());
    let bytes = fs::read(&png).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_validate_reports_success() {
    let dir = tempdir().unwrap();
    let input = write_sample(dir.path());
    let output = dfdraw(&["validate", "-i", &input], None);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("✓ Valid diagram: 3 nodes, 2 flows"));
}

#[test]
fn test_validate_fails_on_dangling_flow() {
    let doc = r#"{"processes":[{"id":"P1","name":"A"}],
        "dataFlows":[{"id":"F","sourceId":"P1","targetId":"ghost","label":""}]}"#;
    let output = dfdraw(&["validate", "--color", "never"], Some(doc));
    assert!(!output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("✗ flow 'F' references missing node 'ghost'"));
}

#[test]
fn test_layout_resolves_placeholders() {
    let output = dfdraw(&["layout"], Some(SAMPLE));
    let scene = stdout_json(&output);
    let nodes = scene["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
}

#[test]
fn test_add_node_then_flow() {
    let output = dfdraw(&["add-node", "--kind", "process", "--name", "Ship"], Some(SAMPLE));
    let graph = stdout_json(&output);
    let processes = graph["processes"].as_array().unwrap();
    assert_eq!(processes.len(), 2);
    let new_id = processes[1]["id"].as_str().unwrap().to_string();
    assert_eq!(processes[1]["name"], "Ship");

    let output = dfdraw(
        &["add-flow", "--from", "P1", "--to", &new_id, "--bidirectional"],
        Some(&graph.to_string()),
    );
    let graph = stdout_json(&output);
    let flows = graph["dataFlows"].as_array().unwrap();
    assert_eq!(flows.len(), 3);
    assert_eq!(flows[2]["label"], "Data Sync");
    assert_eq!(flows[2]["isBidirectional"], true);
}

#[test]
fn test_add_flow_rejects_unknown_endpoint() {
    let output = dfdraw(&["add-flow", "--from", "P1", "--to", "nope"], Some(SAMPLE));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope"));
}

#[test]
fn test_delete_cascades_to_flows() {
    let output = dfdraw(&["delete", "P1"], Some(SAMPLE));
    let graph = stdout_json(&output);
    assert!(graph["processes"].as_array().unwrap().is_empty());
    assert!(graph["dataFlows"].as_array().unwrap().is_empty());
}

#[test]
fn test_move_stores_coordinates() {
    let output = dfdraw(&["move", "S1", "-120", "45.5"], Some(SAMPLE));
    let graph = stdout_json(&output);
    let store = &graph["dataStores"][0];
    assert_eq!(store["x"], -120.0);
    assert_eq!(store["y"], 45.5);
}

#[test]
fn test_patch_renames_flow() {
    let output = dfdraw(&["patch", "F1", r#"{"label":"Purchase"}"#], Some(SAMPLE));
    let graph = stdout_json(&output);
    assert_eq!(graph["dataFlows"][0]["label"], "Purchase");
}

#[cfg(unix)]
#[test]
fn test_propose_from_csv_writes_graph() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("flows.csv");
    fs::write(&csv, "source,target\nUser,Login\n").unwrap();
    let script = r#"cat > /dev/null; echo '{"action":"complete","message":"Built it","updated_dfd":{"processes":[{"id":"P1","number":"1","name":"Login"}]}}'"#;

    let output = dfdraw(
        &["propose", "--command", "sh", "--csv", csv.to_str().unwrap(), "--", "-c", script],
        None,
    );
    let graph = stdout_json(&output);
    assert_eq!(graph["processes"][0]["name"], "Login");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Built it"));
}

#[cfg(unix)]
#[test]
fn test_propose_failure_exits_non_zero() {
    let dir = tempdir().unwrap();
    let graph = write_sample(dir.path());
    let output = dfdraw(
        &["propose", "--command", "sh", "-g", &graph, "--instruction", "hi", "--", "-c", "exit 4"],
        None,
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exited with"));
}

#[cfg(unix)]
#[test]
fn test_propose_instruction_needs_a_graph() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("ran");
    let script = format!("touch {}; cat > /dev/null", marker.display());
    let output = dfdraw(
        &["propose", "--command", "sh", "--instruction", "add a db", "--", "-c", &script],
        None,
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no diagram to refine"));
    assert!(!marker.exists());
}
