// One refresh tick: count every entry, then build what the window shows

use crate::counter::CountTool;
use crate::deadline::{Remaining, remaining};
use crate::models::{Config, CountResult};
use chrono::NaiveDateTime;
use std::fmt;
use tracing::{debug, info_span};

/// Placeholder shown instead of a count that could not be fetched.
pub const PLACEHOLDER: &str = "N/A";
pub const TOTAL_LABEL: &str = "Total";

/// Value in the right-hand column of a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountCell {
    Count(u64),
    /// Carries the short failure reason and the full error text
    Unavailable { reason: &'static str, detail: String },
}

impl fmt::Display for CountCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountCell::Count(n) => write!(f, "{}", n),
            CountCell::Unavailable { .. } => write!(f, "{}", PLACEHOLDER),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub display: String,
    pub cell: CountCell,
}

/// Sum of the counts that succeeded; `failed` entries are left out of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TotalRow {
    pub sum: u64,
    pub failed: usize,
}

impl fmt::Display for TotalRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed == 0 {
            write!(f, "{}", self.sum)
        } else {
            write!(f, "{} ({} unavailable)", self.sum, self.failed)
        }
    }
}

/// Toolkit-independent snapshot of the widget contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderModel {
    pub deadline_label: String,
    pub rows: Vec<Row>,
    pub total: Option<TotalRow>,
    pub remaining: Remaining,
}

/// Counts every configured entry sequentially, in display order.
pub fn fetch_counts(config: &Config, tool: &dyn CountTool) -> Vec<CountResult> {
    let _span = info_span!("refresh", files = config.files.len()).entered();
    config
        .files
        .iter()
        .map(|entry| {
            let outcome = tool.fetch_count(&entry.filename);
            if let Ok(count) = &outcome {
                debug!(display = %entry.display, count, "counted");
            }
            CountResult {
                entry: entry.clone(),
                outcome,
            }
        })
        .collect()
}

impl RenderModel {
    pub fn build(config: &Config, counts: &[CountResult], now: NaiveDateTime) -> Self {
        let rows = counts
            .iter()
            .map(|result| Row {
                display: result.entry.display.clone(),
                cell: match &result.outcome {
                    Ok(count) => CountCell::Count(*count),
                    Err(e) => CountCell::Unavailable {
                        reason: e.short_reason(),
                        detail: e.to_string(),
                    },
                },
            })
            .collect();

        let total = config.show_total.then(|| TotalRow {
            sum: counts
                .iter()
                .filter_map(CountResult::count)
                .fold(0u64, u64::saturating_add),
            failed: counts.iter().filter(|r| r.outcome.is_err()).count(),
        });

        Self {
            deadline_label: config.deadline_label(),
            rows,
            total,
            remaining: remaining(config.deadline, now),
        }
    }

    /// Countdown line as shown under the rows.
    pub fn remaining_text(&self) -> String {
        match self.remaining {
            Remaining::Overdue => String::from("Deadline passed (overdue)"),
            left => format!("{} remaining", left),
        }
    }

    /// Plain-text rendering used by `--once`.
    pub fn to_text(&self) -> String {
        let width = self
            .rows
            .iter()
            .map(|r| r.display.chars().count())
            .chain(self.total.map(|_| TOTAL_LABEL.len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for row in &self.rows {
            let value = match &row.cell {
                CountCell::Count(n) => n.to_string(),
                CountCell::Unavailable { reason, .. } => format!("{} ({})", PLACEHOLDER, reason),
            };
            out.push_str(&format!("{:<width$}  {}\n", format!("{}:", row.display), value, width = width + 1));
        }
        if let Some(total) = &self.total {
            out.push_str(&format!("{:<width$}  {}\n", format!("{}:", TOTAL_LABEL), total, width = width + 1));
        }
        out.push_str(&format!("Deadline {}: {}\n", self.deadline_label, self.remaining_text()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::{CountError, MockCountTool};
    use crate::logging::TEST_LOGGING;
    use crate::models::{CounterCommand, SourceFileEntry};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn entry(filename: &str, display: &str) -> SourceFileEntry {
        SourceFileEntry {
            filename: PathBuf::from(filename),
            display: display.to_string(),
        }
    }

    fn config(show_total: bool) -> Config {
        Config {
            files: vec![
                entry("intro.tex", "Intro"),
                entry("method.tex", "Method"),
                entry("results.tex", "Results"),
            ],
            ddl: "2022-05-23 23:00".into(),
            time_format: "%Y-%m-%d %H:%M".into(),
            deadline: at("2022-05-23 23:00"),
            show_total,
            refresh_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
            counter: CounterCommand::default(),
            pattern: None,
            always_on_top: true,
            base_dir: PathBuf::from("."),
        }
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn tool_with_one_failure() -> MockCountTool {
        let mut tool = MockCountTool::new();
        tool.expect_fetch_count()
            .times(3)
            .returning(|path: &Path| match path.to_str() {
                Some("intro.tex") => Ok(10),
                Some("method.tex") => Ok(20),
                _ => Err(CountError::Unparseable {
                    excerpt: "garbage".into(),
                }),
            });
        tool
    }

    #[test]
    fn total_skips_failed_entries() {
        *TEST_LOGGING;
        let config = config(true);
        let counts = fetch_counts(&config, &tool_with_one_failure());
        let model = RenderModel::build(&config, &counts, at("2022-05-23 22:00"));

        assert_eq!(model.total, Some(TotalRow { sum: 30, failed: 1 }));
        assert_eq!(model.total.unwrap().to_string(), "30 (1 unavailable)");
        assert_eq!(model.rows[2].cell.to_string(), PLACEHOLDER);
        assert!(matches!(
            model.rows[2].cell,
            CountCell::Unavailable { reason: "no count", .. }
        ));
    }

    #[test]
    fn huge_counts_saturate_the_total() {
        let config = config(true);
        let mut tool = MockCountTool::new();
        tool.expect_fetch_count()
            .times(3)
            .returning(|path: &Path| match path.to_str() {
                Some("results.tex") => Err(CountError::Unparseable {
                    excerpt: "garbage".into(),
                }),
                _ => Ok(u64::MAX / 2 + 1),
            });
        let counts = fetch_counts(&config, &tool);
        let model = RenderModel::build(&config, &counts, at("2022-05-23 22:00"));

        assert_eq!(model.total, Some(TotalRow { sum: u64::MAX, failed: 1 }));
    }

    #[test]
    fn rows_follow_config_order() {
        let config = config(false);
        let counts = fetch_counts(&config, &tool_with_one_failure());
        let model = RenderModel::build(&config, &counts, at("2022-05-23 22:00"));

        let labels: Vec<_> = model.rows.iter().map(|r| r.display.as_str()).collect();
        assert_eq!(labels, ["Intro", "Method", "Results"]);
        assert_eq!(model.rows[0].cell, CountCell::Count(10));
        assert_eq!(model.rows[1].cell, CountCell::Count(20));
        assert!(model.total.is_none());
    }

    #[test]
    fn countdown_comes_from_deadline() {
        let config = config(false);
        let counts = fetch_counts(&config, &tool_with_one_failure());

        let model = RenderModel::build(&config, &counts, at("2022-05-23 22:00"));
        assert_eq!(model.remaining_text(), "1:00:00 remaining");

        let late = RenderModel::build(&config, &counts, at("2022-05-24 09:00"));
        assert!(late.remaining.is_overdue());
        assert_eq!(late.remaining_text(), "Deadline passed (overdue)");
    }

    #[test]
    fn text_rendering_marks_failures() {
        let config = config(true);
        let counts = fetch_counts(&config, &tool_with_one_failure());
        let text = RenderModel::build(&config, &counts, at("2022-05-23 22:00")).to_text();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Intro:    10",
                "Method:   20",
                "Results:  N/A (no count)",
                "Total:    30 (1 unavailable)",
                "Deadline 2022-05-23 23:00: 1:00:00 remaining",
            ]
        );
    }
}
