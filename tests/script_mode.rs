use std::path::Path;

use serde_json::Value;
use tether::{config::Config, test_mode::run_test_mode};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn replay(script: &str) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    run_test_mode(Config::default(), script.as_bytes(), &mut out)?;
    let lines = String::from_utf8(out)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<Vec<Value>, _>>()?;
    for line in &lines {
        println!("{line}");
    }
    Ok(lines)
}

fn routes(lines: &[Value]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| l["route"]["route"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_popup_menu_demo() -> TestResult {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/popup_menu.jsonl");
    let script = std::fs::read_to_string(path)?;
    let lines = replay(&script)?;

    assert!(lines.iter().all(|l| l.get("error").is_none()));
    assert!(lines.iter().all(|l| l.get("parse_error").is_none()));
    assert_eq!(
        routes(&lines),
        vec!["normal", "normal", "popup", "passthrough", "normal"]
    );
    let done = lines
        .iter()
        .filter(|l| l["data"]["event"] == "popup_done")
        .count();
    assert_eq!(done, 1);
    Ok(())
}

#[test]
fn test_protocol_error_ends_the_client() -> TestResult {
    let script = r#"
{"op":"connect","client":"app"}
{"op":"create_surface","client":"app","name":"win"}
{"op":"role","client":"app","surface":"win","role":{"type":"toplevel"}}
{"op":"ack","client":"app","surface":"win","serial":9999}
{"op":"create_surface","client":"app","name":"late"}
"#;
    let lines = replay(script)?;

    let errors: Vec<&Value> = lines.iter().filter(|l| l.get("error").is_some()).collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["severity"], "ProtocolViolation");
    assert_eq!(errors[1]["severity"], "ResourceGone");
    assert!(lines
        .iter()
        .any(|l| l["data"]["event"] == "protocol_error"));
    assert!(lines
        .iter()
        .any(|l| l["data"]["event"] == "surface_destroyed"));
    Ok(())
}
