//! Integration tests for the bvgraph binary

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn bvgraph(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bvgraph"))
        .args(args)
        .output()
        .expect("failed to run bvgraph")
}

/// Write `content` to a uniquely named file in the temp directory
fn temp_gnf(name: &str, content: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("bvgraph_{}_{name}.gnf", std::process::id()));
    fs::write(&path, content).expect("failed to write temp file");
    path
}

const PATH_PROBLEM: &str = "\
p cnf 7 3
digraph 3 3 0
bv 0 3 4 5 6
edge 0 0 1 1 2
edge_bv 0 1 2 2 0
edge 0 0 2 3 7
distance_leq 0 0 2 7 5
7 0
-3 0
1 0
";

#[test]
fn test_cli_help() {
    let output = bvgraph(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("solve"));
    assert!(stdout.contains("demo"));
}

#[test]
fn test_cli_version() {
    let output = bvgraph(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("bvgraph"));
}

#[test]
fn test_demo_output() {
    let output = bvgraph(&["demo", "--seed", "42"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "begin encode");
    assert_eq!(lines[1], "RandomSeed=42");
    assert_eq!(lines[2], "Result is true");

    let values: Vec<u64> = lines[3..]
        .iter()
        .map(|l| l.split(" = ").nth(1).unwrap().parse().unwrap())
        .collect();
    assert_eq!(values.len(), 6);
    assert!(lines[3].starts_with("bv0 = "));
    let [w1, w2, w3, w4, d1, d2] = values[..] else {
        panic!("expected six values");
    };
    assert_eq!(d1 + d2, 10);
    assert!(d2 > 4);
    assert_eq!(d1, (w1 + w3).min(w2) + w4);
    assert_eq!(d2, w3 + w4);
}

#[test]
fn test_solve_text() {
    let path = temp_gnf("text", PATH_PROBLEM);
    let output = bvgraph(&["solve", path.to_str().unwrap(), "--minimize", "0"]);
    fs::remove_file(&path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("s SATISFIABLE\n"));
    assert!(stdout.contains("v bv0 = 0\n"));
}

#[test]
fn test_solve_json_with_failed_assumption() {
    let path = temp_gnf("json", PATH_PROBLEM);
    let output = bvgraph(&[
        "solve",
        path.to_str().unwrap(),
        "--assume",
        "-2",
        "--format",
        "json",
    ]);
    fs::remove_file(&path).ok();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["result"], "unsat");
    let conflict = report["conflict"].as_array().unwrap();
    assert!(conflict.contains(&serde_json::json!(2)));
}

#[test]
fn test_solve_reports_parse_errors() {
    let path = temp_gnf("broken", "p cnf 1 1\nedge 9 0 1 1\n1 0\n");
    let output = bvgraph(&["solve", path.to_str().unwrap()]);
    fs::remove_file(&path).ok();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parse error at line 2"));
    assert!(stderr.contains("undeclared graph 9"));
}

#[test]
fn test_solve_missing_file() {
    let output = bvgraph(&["solve", "/nonexistent/problem.gnf"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("opening"));
}

#[test]
fn test_unknown_assumption_variable() {
    let path = temp_gnf("assume", PATH_PROBLEM);
    let output = bvgraph(&["solve", path.to_str().unwrap(), "--assume", "99"]);
    fs::remove_file(&path).ok();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--assume 99"));
}

#[test]
fn test_completions() {
    let output = bvgraph(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("bvgraph"));
}
