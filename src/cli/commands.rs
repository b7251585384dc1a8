use std::path::Path;

use tracing::info;

use crate::cli::config::ResolvedRun;
use crate::device::uiautomator::UiAutomatorDevice;
use crate::engine::runner::ScriptRunner;
use crate::export::FileExporter;
use crate::graph::script_graph::get_expected_screen_nrs;
use crate::report::console::format_console_report;
use crate::script::builder::load_script;
use crate::trace::logger::TraceLogger;

// ============================================================================
// run subcommand
// ============================================================================

/// Run a script against the configured device and return whether it
/// reached a terminal screen.
pub fn cmd_run(
    script_path: &str,
    settings: &ResolvedRun,
    report_path: Option<&str>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let script = load_script(Path::new(script_path))?;
    let device = UiAutomatorDevice::new(&settings.host, settings.port, settings.serial.as_deref());
    info!(endpoint = device.endpoint(), script = script_path, "connecting to device");

    let tracer = match &settings.trace {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    let mut runner = ScriptRunner::new(&script, device, settings.options).with_tracer(tracer);
    if let Some(dir) = &settings.export_dir {
        runner = runner.with_exporter(FileExporter::new(dir));
    }

    let report = runner.run_to_report();
    print!("{}", format_console_report(&report));

    if let Some(path) = report_path {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }

    Ok(report.succeeded())
}

// ============================================================================
// validate subcommand
// ============================================================================

pub fn cmd_validate(script_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let script = load_script(Path::new(script_path))?;

    println!(
        "{} {}: {} screens, {} edges, start screens {}",
        script.app_name,
        script.version,
        script.graph.screen_count(),
        script.graph.edges().len(),
        script.graph.start_nodes()
    );
    Ok(())
}

// ============================================================================
// expected subcommand
// ============================================================================

pub fn cmd_expected(
    script_path: &str,
    screen_nr: u32,
    action_index: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let script = load_script(Path::new(script_path))?;
    if script.graph.screen(screen_nr).is_none() {
        return Err(format!("screen {} is not declared in {}", screen_nr, script_path).into());
    }

    let expected = get_expected_screen_nrs(&script.graph, screen_nr, action_index);
    println!("{}", expected);
    Ok(())
}
