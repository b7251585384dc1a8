use apk_controller::report::console::format_console_report;
use apk_controller::report::report_model::{RunReport, RunStatus};

// ============================================================================
// Helper builders
// ============================================================================

fn done_report() -> RunReport {
    RunReport {
        app_name: "org.torproject.android".into(),
        version: "16.6.3 RC 1".into(),
        status: RunStatus::Done,
        past_screens: vec![1, 2, 3, 4],
        actions_performed: 3,
        error: None,
        duration_ms: Some(12_400),
    }
}

fn failed_report() -> RunReport {
    RunReport {
        status: RunStatus::Failed,
        past_screens: vec![1],
        actions_performed: 1,
        error: Some("none of the expected screens [2] matched after 3 polls in 2.00s".into()),
        duration_ms: None,
        ..done_report()
    }
}

// ============================================================================
// Console Reporter Tests
// ============================================================================

#[test]
fn console_report_done_run() {
    let output = format_console_report(&done_report());

    assert!(output.starts_with("=== Script: org.torproject.android 16.6.3 RC 1 ===\n"));
    assert!(output.contains("\u{2713} DONE  4 screens, 3 actions"));
    assert!(output.contains("path: 1 -> 2 -> 3 -> 4"));
    assert!(!output.contains("[ERROR]"));
    assert!(output.ends_with("=== Finished in 12.4s ===\n"));
}

#[test]
fn console_report_failed_run() {
    let output = format_console_report(&failed_report());

    assert!(output.contains("\u{2717} FAILED  1 screens, 1 actions"));
    assert!(output.contains("path: 1\n"));
    assert!(output.contains("[ERROR] none of the expected screens [2]"));
    assert!(output.ends_with("=== Finished ===\n"));
}

#[test]
fn console_report_without_screens_has_no_path() {
    let report = RunReport {
        past_screens: Vec::new(),
        actions_performed: 0,
        ..failed_report()
    };
    assert!(!format_console_report(&report).contains("path:"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn json_report_round_trips_and_skips_empty_fields() {
    let json = serde_json::to_string(&done_report()).unwrap();

    assert!(json.contains("\"status\":\"done\""));
    assert!(!json.contains("\"error\""));

    let parsed: RunReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, done_report());
    assert!(parsed.succeeded());
}

#[test]
fn json_report_keeps_error_of_failed_run() {
    let value = serde_json::to_value(failed_report()).unwrap();

    assert_eq!(value["status"], "failed");
    assert_eq!(value["past_screens"], serde_json::json!([1]));
    assert!(value["error"].as_str().unwrap().contains("3 polls"));
    assert!(value.get("duration_ms").is_none());
}
