use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::device::Device;
use crate::engine::dispatcher::{perform_action, single_action};
use crate::engine::error::ScriptError;
use crate::engine::history::History;
use crate::engine::matcher::{ScreenMatch, can_proceed};
use crate::export::{NoExport, ScreenExporter};
use crate::graph::script_graph::ExpectedScreenSet;
use crate::report::report_model::{RunReport, RunStatus};
use crate::script::script_model::Script;
use crate::trace::{logger::TraceLogger, trace::TraceEvent};

// ============================================================================
// Runner state machine
// ============================================================================

/// States of a script run.
///
/// `Init → AwaitScreen → Act → AwaitScreen → … → Done | Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// App not launched yet
    Init,

    /// Waiting for one of `expected` to be displayed
    AwaitScreen {
        expected: ExpectedScreenSet,
        retry: bool,
    },

    /// A screen was detected; record it, select and dispatch its action
    Act { observed: ScreenMatch },

    /// A screen selected no action
    Done,

    /// A run-aborting error occurred
    Failed,
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Init => "init",
            RunState::AwaitScreen { .. } => "await_screen",
            RunState::Act { .. } => "act",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

/// Run-level switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Passed on to the history; lets the export hook replace files
    pub overwrite: bool,

    /// Before the first detection, poll the start screens with their retry
    /// budgets so a slow app launch does not fail the fast path
    pub await_launch: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            await_launch: true,
        }
    }
}

/// Drives one device through a script's screen graph.
///
/// Owns the device handle and the run history for the whole run. The
/// history stays readable after the run ends, including after a failure.
pub struct ScriptRunner<'s, D: Device, C: Clock = SystemClock> {
    script: &'s Script,
    device: D,
    clock: C,
    exporter: Box<dyn ScreenExporter>,
    tracer: TraceLogger,
    options: RunOptions,
    history: History,
    state: RunState,
    cycle: u64,
    actions_performed: usize,
}

impl<'s, D: Device> ScriptRunner<'s, D, SystemClock> {
    pub fn new(script: &'s Script, device: D, options: RunOptions) -> Self {
        Self::with_clock(script, device, SystemClock::new(), options)
    }
}

impl<'s, D: Device, C: Clock> ScriptRunner<'s, D, C> {
    pub fn with_clock(script: &'s Script, device: D, clock: C, options: RunOptions) -> Self {
        Self {
            script,
            device,
            clock,
            exporter: Box::new(NoExport),
            tracer: TraceLogger::disabled(),
            options,
            history: History::new(&script.app_name, &script.version, options.overwrite),
            state: RunState::Init,
            cycle: 0,
            actions_performed: 0,
        }
    }

    pub fn with_exporter(mut self, exporter: impl ScreenExporter + 'static) -> Self {
        self.exporter = Box::new(exporter);
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Mutable access, e.g. to seed extensions before the run starts.
    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn actions_performed(&self) -> usize {
        self.actions_performed
    }

    /// Run until the script is done or an error aborts it.
    pub fn run(&mut self) -> Result<(), ScriptError> {
        info!(
            app = %self.script.app_name,
            version = %self.script.version,
            "starting script"
        );

        while !self.state.is_terminal() {
            self.step()?;
        }

        info!(past_screens = ?self.history.past_screens, "done with script");
        Ok(())
    }

    /// Run and summarize the outcome, whether done or failed.
    pub fn run_to_report(&mut self) -> RunReport {
        let started = self.clock.elapsed();
        let result = self.run();
        let duration = self.clock.elapsed().saturating_sub(started);
        self.report(result.err().as_ref()).with_duration(duration.as_millis())
    }

    pub fn report(&self, error: Option<&ScriptError>) -> RunReport {
        RunReport {
            app_name: self.history.app_name.clone(),
            version: self.history.version.clone(),
            status: if error.is_none() && self.state == RunState::Done {
                RunStatus::Done
            } else {
                RunStatus::Failed
            },
            past_screens: self.history.past_screens.clone(),
            actions_performed: self.actions_performed,
            error: error.map(ToString::to_string),
            duration_ms: None,
        }
    }

    /// Perform one state transition. Any error moves the runner to
    /// `Failed`; performed device interactions are not rolled back.
    pub fn step(&mut self) -> Result<&RunState, ScriptError> {
        let current = std::mem::replace(&mut self.state, RunState::Failed);

        match self.transition(current) {
            Ok(next) => {
                self.state = next;
                Ok(&self.state)
            }
            Err(error) => {
                warn!(
                    error = %error,
                    past_screens = ?self.history.past_screens,
                    "script run failed"
                );
                self.tracer
                    .log(&TraceEvent::now(self.cycle, RunState::Failed.name()).with_error(&error));
                Err(error)
            }
        }
    }

    fn transition(&mut self, state: RunState) -> Result<RunState, ScriptError> {
        match state {
            RunState::Init => self.init(),
            RunState::AwaitScreen { expected, retry } => {
                let observed = can_proceed(
                    &mut self.device,
                    &self.clock,
                    &self.script.graph,
                    &expected,
                    retry,
                )?;
                Ok(RunState::Act { observed })
            }
            RunState::Act { observed } => self.act(observed),
            terminal @ (RunState::Done | RunState::Failed) => Ok(terminal),
        }
    }

    fn init(&mut self) -> Result<RunState, ScriptError> {
        let start = self.script.graph.start_nodes();

        self.device.launch(&self.script.app_name)?;
        info!(app = %self.script.app_name, start_screens = %start, "launched app");

        if self.options.await_launch {
            can_proceed(&mut self.device, &self.clock, &self.script.graph, &start, true)?;
        }

        // The first detection takes the fast path; later ones retry.
        Ok(RunState::AwaitScreen {
            expected: start,
            retry: false,
        })
    }

    fn act(&mut self, observed: ScreenMatch) -> Result<RunState, ScriptError> {
        let script = self.script;
        let screen_nr = observed.screen_nr;
        let screen = script
            .graph
            .screen(screen_nr)
            .ok_or(ScriptError::UnknownScreen(screen_nr))?;

        self.cycle += 1;
        self.history.record_screen(screen_nr);
        info!(cycle = self.cycle, screen_nr, "detected screen");

        self.exporter.export(&mut self.device, screen_nr, &self.history)?;

        let selected = screen.select_action(&observed.required, &observed.optional, &self.history);
        let Some(action) = single_action(screen_nr, selected)? else {
            self.tracer.log(
                &TraceEvent::now(self.cycle, RunState::Done.name())
                    .with_screen(screen_nr, observed.polls, observed.optional.len()),
            );
            return Ok(RunState::Done);
        };

        let expected = perform_action(
            &mut self.device,
            &script.graph,
            &observed,
            &action,
            &mut self.history,
        )?;
        self.actions_performed += 1;

        info!(screen_nr, action = %action, expected = %expected, "action done");
        self.tracer.log(
            &TraceEvent::now(self.cycle, "act")
                .with_screen(screen_nr, observed.polls, observed.optional.len())
                .with_action(&action)
                .with_expected(&expected),
        );

        Ok(RunState::AwaitScreen {
            expected,
            retry: true,
        })
    }
}
