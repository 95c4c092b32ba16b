use std::fs;
use std::process::Command;

use ut_test_example::fixture_dir;

#[test]
fn run_mode_passes_every_demo_scenario() {
    let bin = env!("CARGO_BIN_EXE_ut-cli");
    let report = std::env::temp_dir().join(format!("ut-cli-report-{}.json", std::process::id()));

    let output = Command::new(bin)
        .arg("run")
        .arg("--dir")
        .arg(fixture_dir("demo"))
        .arg("--report")
        .arg(&report)
        .output()
        .expect("cli should execute");

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        panic!(
            "demo run failed\nstdout:\n{}\nstderr:\n{}",
            stdout,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    assert!(stdout.contains("RESULT:OK"));
    assert!(stdout.contains("SUMMARY:tested=4 passed=4 failed=0 skipped=0"));
    assert!(stdout.contains("VERDICT:demo_test/test1:PASSED"));
    assert!(stdout.contains("VERDICT:browser/open_button:PASSED"));

    let json = fs::read_to_string(&report).expect("report should be written");
    let value: serde_json::Value = serde_json::from_str(&json).expect("report should parse");
    assert_eq!(value["schemaVersion"], "ut-results.v1");
    assert_eq!(value["host"], "ut-cli");
    assert_eq!(value["summary"]["passed"], 4);
    fs::remove_file(&report).expect("cleanup should pass");
}

#[test]
fn run_mode_fails_when_the_file_is_missing() {
    let bin = env!("CARGO_BIN_EXE_ut-cli");
    let empty = std::env::temp_dir().join(format!("ut-cli-empty-{}", std::process::id()));
    fs::create_dir_all(&empty).expect("dir should be created");

    let output = Command::new(bin)
        .arg("run")
        .arg("--dir")
        .arg(&empty)
        .arg("--group")
        .arg("demo_test")
        .output()
        .expect("cli should execute");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("RESULT:OK"));
    assert!(stdout.contains("VERDICT:demo_test/test1:FAILED:ELEMENT_NOT_FOUND"));
    fs::remove_dir_all(&empty).expect("cleanup should pass");
}

#[test]
fn run_mode_reports_bad_arguments_as_errors() {
    let bin = env!("CARGO_BIN_EXE_ut-cli");
    let output = Command::new(bin)
        .arg("run")
        .arg("--dir")
        .arg(fixture_dir("demo"))
        .arg("--group")
        .arg("nothing_here")
        .output()
        .expect("cli should execute");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:CLI_GROUP_EMPTY"));
}
