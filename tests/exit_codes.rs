use std::process::Command;

fn jarindex_binary() -> String {
    std::env::var("CARGO_BIN_EXE_jarindex").unwrap_or_else(|_| {
        let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        path.push("jarindex");
        if cfg!(windows) {
            path.set_extension("exe");
        }
        path.to_string_lossy().to_string()
    })
}

#[test]
fn jarindex_exits_non_zero_on_missing_input() {
    let output = Command::new(jarindex_binary())
        .arg("--input")
        .arg("missing.jar")
        .output()
        .expect("run jarindex");

    assert!(!output.status.success());
}

#[test]
fn jarindex_exits_non_zero_on_invalid_config() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let config = temp_dir.path().join("jarindex.json");
    std::fs::write(&config, r#"{"unknown": true}"#).expect("write config");

    let output = Command::new(jarindex_binary())
        .arg("--input")
        .arg(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .output()
        .expect("run jarindex");

    assert!(!output.status.success());
}

#[test]
fn jarindex_reports_corrupt_class_without_failing() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(temp_dir.path().join("Bad.class"), b"\xca\xfe\xba\xbe\x00").expect("write class");

    let output = Command::new(jarindex_binary())
        .arg("--input")
        .arg(temp_dir.path())
        .output()
        .expect("run jarindex");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse report");
    assert_eq!(report["failures"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["usage_count"], serde_json::json!(0));
}
