use std::fs;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tracing::{debug, info};

use crate::device::Device;
use crate::engine::error::ScriptError;
use crate::engine::history::History;
use crate::graph::screen_model::ScreenNr;

// ============================================================================
// Export hook: persist the hierarchy of matched screens
// ============================================================================

/// Side channel that persists data of each matched screen.
pub trait ScreenExporter {
    fn export(
        &self,
        device: &mut dyn Device,
        screen_nr: ScreenNr,
        history: &History,
    ) -> Result<ExportOutcome, ScriptError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Disabled,
    Written(PathBuf),
    /// File exists and `overwrite` is off
    Kept(PathBuf),
    /// File exists with identical content
    Unchanged(PathBuf),
}

/// Exporting switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExport;

impl ScreenExporter for NoExport {
    fn export(&self, _: &mut dyn Device, _: ScreenNr, _: &History) -> Result<ExportOutcome, ScriptError> {
        Ok(ExportOutcome::Disabled)
    }
}

/// Writes the device's hierarchy dump to
/// `<root>/<app_name>/<version>/screen_<nr>.xml`.
///
/// An existing file is only replaced when the run's `overwrite` flag is set
/// and the new dump differs from it.
#[derive(Debug, Clone)]
pub struct FileExporter {
    root: PathBuf,
}

impl FileExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn screen_path(&self, history: &History, screen_nr: ScreenNr) -> PathBuf {
        self.root
            .join(path_component(&history.app_name))
            .join(path_component(&history.version))
            .join(format!("screen_{}.xml", screen_nr))
    }
}

impl ScreenExporter for FileExporter {
    fn export(
        &self,
        device: &mut dyn Device,
        screen_nr: ScreenNr,
        history: &History,
    ) -> Result<ExportOutcome, ScriptError> {
        let path = self.screen_path(history, screen_nr);

        if path.exists() && !history.overwrite {
            debug!(path = %path.display(), "screen already exported, overwrite off");
            return Ok(ExportOutcome::Kept(path));
        }

        let dump = device.dump_hierarchy()?;

        if let Ok(existing) = fs::read_to_string(&path) {
            if fingerprint(&existing) == fingerprint(&dump) {
                return Ok(ExportOutcome::Unchanged(path));
            }
        }

        write_dump(&path, &dump).map_err(|source| ScriptError::Export {
            path: path.display().to_string(),
            source,
        })?;
        info!(screen_nr, path = %path.display(), "exported screen hierarchy");
        Ok(ExportOutcome::Written(path))
    }
}

fn write_dump(path: &Path, dump: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, dump)
}

/// App names and versions as directory names: `org.app 1.2` → `org_app_1_2`.
pub fn path_component(raw: &str) -> String {
    raw.replace(['.', ' '], "_")
}

pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
