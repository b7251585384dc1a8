use crate::{
    clock::Clock,
    device::Device,
    engine::runner::{RunOptions, ScriptRunner},
    report::report_model::RunReport,
    script::script_model::Script,
};

pub mod cli;
pub mod clock;
pub mod device;
pub mod engine;
pub mod export;
pub mod graph;
pub mod logging;
pub mod report;
pub mod script;
pub mod trace;

pub use engine::error::ScriptError;
pub use graph::script_graph::get_expected_screen_nrs;

/// Run `script` once on `device` with the given clock and summarize the
/// outcome. Export and run trace stay disabled; build a `ScriptRunner`
/// directly to enable them.
pub fn run_script<D: Device, C: Clock>(
    script: &Script,
    device: D,
    clock: C,
    options: RunOptions,
) -> RunReport {
    ScriptRunner::with_clock(script, device, clock, options).run_to_report()
}
