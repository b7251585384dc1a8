use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::warn;

use crate::trace::trace::TraceEvent;

/// Appends run trace events to a JSONL file, one line per event.
///
/// Owned by a single runner, so events are written straight to the file
/// without buffering or locking; a trace cut short by a crash still ends on
/// a complete line. Write failures are logged and otherwise ignored.
pub struct TraceLogger {
    file: Option<File>,
}

impl TraceLogger {
    /// Open `path` for appending. The trace is disabled, with a warning, if
    /// the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self { file: Some(file) },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open trace file, run trace disabled");
                Self { file: None }
            }
        }
    }

    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn log(&mut self, event: &TraceEvent) {
        let Some(file) = self.file.as_mut() else {
            return;
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize trace event");
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!(error = %e, "failed to write trace event");
        }
    }
}
