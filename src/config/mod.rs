//! Loading of the JSON config document.
//!
//! The raw document is deserialized with serde, defaults are filled in, and the
//! deadline is parsed once. Anything wrong here is fatal and is reported before
//! the window opens.

use crate::deadline::parse_deadline;
use crate::models::{Config, CounterCommand, SourceFileEntry};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const DEFAULT_REFRESH_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("cannot parse deadline {ddl:?} with format {format:?}: {source}")]
    Deadline {
        ddl: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    files: Vec<SourceFileEntry>,
    ddl: String,
    #[serde(default = "default_time_format")]
    time_format: String,
    #[serde(default)]
    show_total: bool,
    #[serde(default = "default_refresh_secs")]
    refresh_secs: u64,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    counter: CounterCommand,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default = "default_always_on_top")]
    always_on_top: bool,
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_always_on_top() -> bool {
    true
}

/// Reads and validates the config at `path`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));
    let config = parse_config(&content, path, base_dir)?;
    debug!(
        files = config.files.len(),
        deadline = %config.deadline,
        show_total = config.show_total,
        "loaded config from {}",
        path.display()
    );
    Ok(config)
}

fn parse_config(content: &str, path: &Path, base_dir: PathBuf) -> Result<Config, ConfigError> {
    let raw: RawConfig = serde_json::from_str(content).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    if raw.files.is_empty() {
        return Err(ConfigError::Invalid("`files` must list at least one source".into()));
    }
    if raw.refresh_secs == 0 {
        return Err(ConfigError::Invalid("`refresh_secs` must be positive".into()));
    }
    if raw.timeout_secs == 0 {
        return Err(ConfigError::Invalid("`timeout_secs` must be positive".into()));
    }
    if raw.counter.program.trim().is_empty() {
        return Err(ConfigError::Invalid("`counter.program` is empty".into()));
    }

    let pattern = raw.pattern.as_deref().map(compile_pattern).transpose()?;
    let deadline = parse_deadline(&raw.ddl, &raw.time_format)?;

    Ok(Config {
        files: raw.files,
        ddl: raw.ddl,
        time_format: raw.time_format,
        deadline,
        show_total: raw.show_total,
        refresh_interval: Duration::from_secs(raw.refresh_secs),
        timeout: Duration::from_secs(raw.timeout_secs),
        counter: raw.counter,
        pattern,
        always_on_top: raw.always_on_top,
        base_dir,
    })
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    let re = Regex::new(pattern)
        .map_err(|e| ConfigError::Invalid(format!("`pattern` is not a valid regex: {}", e)))?;
    if re.captures_len() < 2 {
        return Err(ConfigError::Invalid(
            "`pattern` needs a capture group around the count".into(),
        ));
    }
    Ok(re)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    fn parse(content: &str) -> Result<Config, ConfigError> {
        parse_config(content, Path::new("config.json"), PathBuf::from("."))
    }

    #[test]
    fn round_trips_fields_in_order() {
        let config = parse(
            r#"{
                "files": [
                    {"filename": "chapters/intro.tex", "display": "Intro"},
                    {"filename": "chapters/method.tex", "display": "Method"},
                    {"filename": "appendix.tex", "display": "Appendix"}
                ],
                "ddl": "23/05/2022 23:00",
                "time_format": "%d/%m/%Y %H:%M",
                "show_total": true,
                "refresh_secs": 30,
                "timeout_secs": 3,
                "counter": {"program": "wc", "args": ["-w"]},
                "pattern": "^(\\d+)",
                "always_on_top": false
            }"#,
        )
        .unwrap();

        let displays: Vec<_> = config.files.iter().map(|f| f.display.as_str()).collect();
        assert_eq!(displays, ["Intro", "Method", "Appendix"]);
        assert_eq!(config.files[0].filename, PathBuf::from("chapters/intro.tex"));
        assert_eq!(config.ddl, "23/05/2022 23:00");
        assert_eq!(config.time_format, "%d/%m/%Y %H:%M");
        assert_eq!(config.deadline.to_string(), "2022-05-23 23:00:00");
        assert!(config.show_total);
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.counter.program, "wc");
        assert_eq!(config.counter.args, ["-w"]);
        assert!(config.pattern.is_some());
        assert!(!config.always_on_top);
        assert_eq!(config.deadline_label(), "23/05/2022 23:00");
    }

    #[test]
    fn applies_defaults() {
        let config = parse(
            r#"{"files": [{"filename": "main.tex", "display": "Thesis"}],
                "ddl": "2022-05-23 23:00"}"#,
        )
        .unwrap();

        assert!(!config.show_total);
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(config.refresh_interval, Duration::from_secs(DEFAULT_REFRESH_SECS));
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.counter, CounterCommand::default());
        assert!(config.pattern.is_none());
        assert!(config.always_on_top);
    }

    #[test]
    fn missing_files_is_malformed() {
        let err = parse(r#"{"ddl": "2022-05-23 23:00"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
        assert!(err.to_string().contains("files"));
    }

    #[test]
    fn missing_ddl_is_malformed() {
        let err = parse(r#"{"files": [{"filename": "a.tex", "display": "A"}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
        assert!(err.to_string().contains("ddl"));
    }

    #[test]
    fn entry_without_display_is_malformed() {
        let err = parse(r#"{"files": [{"filename": "a.tex"}], "ddl": "2022-05-23 23:00"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse("{ not json"), Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn bad_deadline_is_rejected() {
        let err = parse(
            r#"{"files": [{"filename": "a.tex", "display": "A"}], "ddl": "tomorrow"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Deadline { .. }));
    }

    #[test]
    fn validation_errors() {
        let cases = [
            r#"{"files": [], "ddl": "2022-05-23 23:00"}"#,
            r#"{"files": [{"filename": "a.tex", "display": "A"}], "ddl": "2022-05-23 23:00", "refresh_secs": 0}"#,
            r#"{"files": [{"filename": "a.tex", "display": "A"}], "ddl": "2022-05-23 23:00", "timeout_secs": 0}"#,
            r#"{"files": [{"filename": "a.tex", "display": "A"}], "ddl": "2022-05-23 23:00", "counter": {"program": " "}}"#,
            r#"{"files": [{"filename": "a.tex", "display": "A"}], "ddl": "2022-05-23 23:00", "pattern": "("}"#,
            r#"{"files": [{"filename": "a.tex", "display": "A"}], "ddl": "2022-05-23 23:00", "pattern": "\\d+"}"#,
        ];
        for case in cases {
            assert!(
                matches!(parse(case), Err(ConfigError::Invalid(_))),
                "expected Invalid for {case}"
            );
        }
    }

    #[test]
    fn load_from_disk_uses_config_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"files": [{{"filename": "main.tex", "display": "Thesis"}}], "ddl": "2022-05-23 23:00"}}"#
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.base_dir, dir.path());
        assert_eq!(config.files[0].display, "Thesis");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn missing_files_key_on_disk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"ddl": "2022-05-23 23:00"}}"#).unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Malformed { .. })
        ));
    }
}
