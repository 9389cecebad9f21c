//! CLI route smoke tests

use clap::Parser;
use frame_id_map::cli::{Cli, RunContext};
use frame_id_map::config::FrameMapConfig;

fn run(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let context = RunContext::from_config(FrameMapConfig::default());
    context.execute(&cli.command).unwrap()
}

#[test]
fn test_resolve_text_output() {
    let output = run(&[
        "frame-id-map",
        "resolve",
        "--frame",
        "1:2=10,0",
        "--",
        "1:2",
        "-1:-2",
    ]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    // The sentinel answers first, inside its own call.
    assert!(lines[0].starts_with("#1"));
    assert!(lines[0].contains("frame_id=-1"));
    assert!(lines[0].ends_with(" sync"));
    assert!(lines[1].starts_with("#0"));
    assert!(lines[1].contains("frame_id=10"));
    assert!(lines[1].ends_with(" async"));
}

#[test]
fn test_resolve_json_output() {
    let output = run(&[
        "frame-id-map",
        "resolve",
        "--seed",
        "--frame",
        "4:1=40,0",
        "--format",
        "json",
        "4:1",
        "4:1",
    ]);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let deliveries = value["deliveries"].as_array().unwrap();
    assert_eq!(deliveries.len(), 2);
    for delivery in deliveries {
        assert_eq!(delivery["ids"]["frame_id"], 40);
        assert_eq!(delivery["synchronous"], true);
    }
}

#[test]
fn test_config_json_output() {
    let output = run(&["frame-id-map", "config", "--format", "json"]);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["owner"]["thread_name"], "frame-id-owner");
    assert_eq!(value["dispatch"]["max_completions_per_pump"], 0);
}
