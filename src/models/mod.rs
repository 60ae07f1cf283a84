// Data models for watched source files, the loaded config and count results

use crate::counter::CountError;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Deserialize;
use std::fmt::Write;
use std::path::PathBuf;
use std::time::Duration;

/// A single document whose count is shown in the widget.
/// Created from the config at startup and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SourceFileEntry {
    /// Path of the document, relative paths resolve against the config directory
    pub filename: PathBuf,
    /// Label shown next to the count
    pub display: String,
}

/// How the external counting tool is invoked.
/// The source filename is always appended as the last argument.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CounterCommand {
    /// Executable name or path (e.g., texcount)
    pub program: String,
    /// Arguments placed before the filename
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for CounterCommand {
    fn default() -> Self {
        Self {
            program: String::from("texcount"),
            args: vec![String::from("-brief")],
        }
    }
}

/// Fully validated configuration.
/// Loaded once and passed by reference to everything that needs it.
#[derive(Clone, Debug)]
pub struct Config {
    /// Watched documents in display order
    pub files: Vec<SourceFileEntry>,
    /// Deadline exactly as written in the config
    pub ddl: String,
    /// strftime pattern used to parse and display the deadline
    pub time_format: String,
    /// Deadline parsed with `time_format`, in local time
    pub deadline: NaiveDateTime,
    /// Whether to show a Total row under the entries
    pub show_total: bool,
    /// How often counts are re-fetched
    pub refresh_interval: Duration,
    /// Upper bound for a single counting tool invocation
    pub timeout: Duration,
    /// Counting tool invocation
    pub counter: CounterCommand,
    /// Optional custom regex whose first capture group is the count
    pub pattern: Option<Regex>,
    /// Keep the window above other windows
    pub always_on_top: bool,
    /// Directory of the config file, used as the counting tool's working directory
    pub base_dir: PathBuf,
}

impl Config {
    /// Deadline rendered back with the configured format.
    /// Falls back to the raw `ddl` string if the format cannot render.
    pub fn deadline_label(&self) -> String {
        let mut label = String::new();
        match write!(label, "{}", self.deadline.format(&self.time_format)) {
            Ok(()) => label,
            Err(_) => self.ddl.clone(),
        }
    }
}

/// Outcome of counting one entry during a refresh tick.
#[derive(Debug)]
pub struct CountResult {
    /// The entry that was counted
    pub entry: SourceFileEntry,
    /// Parsed count or the reason it is unavailable
    pub outcome: Result<u64, CountError>,
}

impl CountResult {
    pub fn count(&self) -> Option<u64> {
        self.outcome.as_ref().ok().copied()
    }
}
