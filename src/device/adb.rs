use std::process::Command;

use tracing::debug;

use crate::device::DeviceError;

/// Thin wrapper over the `adb` executable for one device.
#[derive(Debug, Clone, Default)]
pub struct Adb {
    serial: Option<String>,
}

impl Adb {
    pub fn new(serial: Option<&str>) -> Self {
        Self {
            serial: serial.map(str::to_string),
        }
    }

    /// Arguments for `adb shell …`, including `-s <serial>` when set.
    pub fn shell_args(&self, shell: &[&str]) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.push("shell".to_string());
        args.extend(shell.iter().map(|s| s.to_string()));
        args
    }

    /// Arguments that start the launcher activity of `app_name`.
    pub fn launch_args(&self, app_name: &str) -> Vec<String> {
        self.shell_args(&[
            "monkey",
            "-p",
            app_name,
            "-c",
            "android.intent.category.LAUNCHER",
            "1",
        ])
    }

    pub fn launch(&self, app_name: &str) -> Result<(), DeviceError> {
        self.run(&self.launch_args(app_name))
    }

    fn run(&self, args: &[String]) -> Result<(), DeviceError> {
        debug!(?args, "running adb");
        let output = Command::new("adb")
            .args(args)
            .output()
            .map_err(|source| DeviceError::Spawn {
                program: "adb".into(),
                source,
            })?;

        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                command: format!("adb {}", args.join(" ")),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
