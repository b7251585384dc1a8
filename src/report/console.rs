use crate::report::report_model::{RunReport, RunStatus};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a run report for terminal output.
///
/// Produces output like:
/// ```text
/// === Script: org.torproject.android 16.6.3 RC 1 ===
///
/// ✓ DONE  4 screens, 3 actions
///     path: 1 -> 2 -> 3 -> 4
///
/// === Finished in 12.4s ===
/// ```
pub fn format_console_report(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Script: {} {} ===\n\n",
        report.app_name, report.version
    ));

    let marker = match report.status {
        RunStatus::Done => "\u{2713} DONE",
        RunStatus::Failed => "\u{2717} FAILED",
    };

    out.push_str(&format!(
        "{}  {} screens, {} actions\n",
        marker,
        report.past_screens.len(),
        report.actions_performed
    ));

    if !report.past_screens.is_empty() {
        let path: Vec<String> = report.past_screens.iter().map(|nr| nr.to_string()).collect();
        out.push_str(&format!("    path: {}\n", path.join(" -> ")));
    }

    if let Some(ref error) = report.error {
        out.push_str(&format!("    [ERROR] {}\n", error));
    }

    out.push_str("\n=== Finished");
    if let Some(ms) = report.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }
    out.push_str(" ===\n");

    out
}
