use std::path::PathBuf;
use std::process::{Command, Output};

use ipc_echo::ipc::EchoRequest;

fn write_script(name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ipc-echo-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn replay(script: &PathBuf, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ipc-echo"))
        .arg("replay")
        .arg(script)
        .args(extra)
        .output()
        .unwrap()
}

fn stdout_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_replay_prints_responses_in_order() {
    let script = write_script(
        "order.json",
        r#"[
            {"method": "echo_simple", "params": {"value": 17}},
            {"method": "echo_string", "params": {"value": "Hello, World", "out_size": 6}},
            {"method": "echo_trigger_event", "params": {"cookie": 3}}
        ]"#,
    );

    let output = replay(&script, &["--batch", "3", "--subscribe"]);
    std::fs::remove_file(&script).ok();
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        serde_json::json!({"id": 0, "response": {"method": "echo_simple", "value": 17}})
    );
    assert_eq!(lines[1]["response"]["value"], "Hello");
    assert_eq!(
        lines[2],
        serde_json::json!({"id": 2, "response": {"method": "echo_trigger_event"}})
    );
}

#[test]
fn test_exit_server_aborts_without_response() {
    let script = write_script(
        "exit.json",
        r#"[
            {"method": "echo_simple", "params": {"value": 1}},
            {"method": "exit_server"},
            {"method": "echo_simple", "params": {"value": 2}}
        ]"#,
    );

    let output = replay(&script, &[]);
    std::fs::remove_file(&script).ok();
    assert!(!output.status.success());

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], 0);
}

#[test]
fn test_replay_rejects_unknown_method() {
    let script = write_script("bad.json", r#"[{"method": "echo_nothing"}]"#);

    let output = replay(&script, &[]);
    std::fs::remove_file(&script).ok();
    assert_eq!(output.status.code(), Some(65));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid JSON script"));
}

#[test]
fn test_invalid_config_has_its_own_status() {
    let config = write_script("zero.toml", "[pools]\nvalue_entries = 0\n");
    let script = write_script("cfg.json", "[]");

    let output = Command::new(env!("CARGO_BIN_EXE_ipc-echo"))
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg(&script)
        .output()
        .unwrap();
    std::fs::remove_file(&config).ok();
    std::fs::remove_file(&script).ok();

    assert_eq!(output.status.code(), Some(78));
    assert!(String::from_utf8_lossy(&output.stderr).contains("value_entries"));
}

#[test]
fn test_msgpack_script_keeps_non_finite_doubles() {
    let nan = f64::from_bits(0x7ff8_0000_0000_0001);
    let requests = vec![
        EchoRequest::EchoDouble {
            value: f64::INFINITY,
        },
        EchoRequest::EchoDouble { value: nan },
        EchoRequest::EchoDouble { value: 0.5 },
    ];
    let script = write_script(
        "doubles.msgpack",
        rmp_serde::to_vec_named(&requests).unwrap(),
    );

    let output = replay(&script, &[]);
    std::fs::remove_file(&script).ok();
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0]["response"]["value"], "inf");
    assert_eq!(lines[0]["response"]["bits"], "0x7ff0000000000000");

    assert_eq!(lines[1]["response"]["value"], "NaN");
    let bits = lines[1]["response"]["bits"].as_str().unwrap();
    assert_eq!(
        u64::from_str_radix(bits.trim_start_matches("0x"), 16).unwrap(),
        nan.to_bits()
    );

    assert_eq!(lines[2]["response"]["value"], 0.5);
}

#[test]
fn test_pipeline_deeper_than_config_is_fatal() {
    let config = write_script("small.toml", "[pools]\nvalue_entries = 1\n");
    let script = write_script(
        "deep.json",
        r#"[
            {"method": "echo_double", "params": {"value": 1.0}},
            {"method": "echo_double", "params": {"value": 2.0}}
        ]"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_ipc-echo"))
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg(&script)
        .args(["--batch", "2"])
        .output()
        .unwrap();
    std::fs::remove_file(&config).ok();
    std::fs::remove_file(&script).ok();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
