//! Optional append-only text logs: a trace log of pipeline messages and a
//! position log with one line per reported pose.
//!
//! Failing to open or write a log never fails localization: the log is
//! disabled and a warning is emitted through `log`.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::pose::Pose;

/// Log file locations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub trace_path: Option<PathBuf>,
    pub position_path: Option<PathBuf>,
}

#[derive(Debug)]
struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    fn open(path: &Path, what: &str) -> Option<Self> {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(Self {
                path: path.to_path_buf(),
                file,
            }),
            Err(err) => {
                log::warn!("{what} log {} disabled: {err}", path.display());
                None
            }
        }
    }
}

/// Write `line` to `slot`, closing the log on failure.
fn write_line(slot: &mut Option<LogFile>, line: &str, what: &str) {
    let Some(log) = slot.as_mut() else {
        return;
    };
    if let Err(err) = writeln!(log.file, "{line}") {
        log::warn!("{what} log {} disabled: {err}", log.path.display());
        *slot = None;
    }
}

/// Open diagnostics logs.
#[derive(Debug)]
pub struct Diagnostics {
    started: Instant,
    trace: Option<LogFile>,
    position: Option<LogFile>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            trace: None,
            position: None,
        }
    }
}

impl Diagnostics {
    /// Open the logs enabled by the flags and configured in `config`.
    pub fn open(config: &DiagnosticsConfig, trace: bool, position: bool) -> Self {
        let mut out = Self::default();
        out.reconfigure(config, trace, position);
        out
    }

    /// Reopen or close the logs after a mode change.
    pub fn reconfigure(&mut self, config: &DiagnosticsConfig, trace: bool, position: bool) {
        self.trace = match (&config.trace_path, trace) {
            (Some(path), true) => LogFile::open(path, "trace"),
            _ => None,
        };
        self.position = match (&config.position_path, position) {
            (Some(path), true) => LogFile::open(path, "position"),
            _ => None,
        };
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace.is_some()
    }

    pub fn position_enabled(&self) -> bool {
        self.position.is_some()
    }

    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Append a timestamped message to the trace log.
    pub fn trace(&mut self, message: fmt::Arguments<'_>) {
        if self.trace.is_none() {
            return;
        }
        let line = format!("{:10.2} {message}", self.elapsed_ms());
        write_line(&mut self.trace, &line, "trace");
    }

    /// Append `time_ms x y z yaw_deg` to the position log.
    pub fn position(&mut self, pose: &Pose) {
        if self.position.is_none() {
            return;
        }
        let line = format!(
            "{:10.2} {:.3} {:.3} {:.3} {:.1}",
            self.elapsed_ms(),
            pose.x,
            pose.y,
            pose.height,
            pose.yaw_degrees()
        );
        write_line(&mut self.position, &line, "position");
    }
}
