// Deadline parsing and countdown formatting

use crate::config::ConfigError;
use chrono::format::{Item, Numeric, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::time::Duration;

/// Time left until the deadline, truncated to whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Remaining {
    Left(Duration),
    Overdue,
}

impl Remaining {
    pub fn is_overdue(&self) -> bool {
        matches!(self, Remaining::Overdue)
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Overdue => write!(f, "overdue"),
            Remaining::Left(left) => {
                let secs = left.as_secs();
                let (days, rest) = (secs / 86_400, secs % 86_400);
                let (hh, rest) = (rest / 3_600, rest % 3_600);
                let (mm, ss) = (rest / 60, rest % 60);
                if days > 0 {
                    write!(f, "{}d {:02}:{:02}:{:02}", days, hh, mm, ss)
                } else {
                    write!(f, "{}:{:02}:{:02}", hh, mm, ss)
                }
            }
        }
    }
}

/// Parses the configured deadline with its strftime pattern.
/// Date-only patterns resolve to midnight; an hour without minutes means `HH:00`.
pub fn parse_deadline(ddl: &str, format: &str) -> Result<NaiveDateTime, ConfigError> {
    let err = match NaiveDateTime::parse_from_str(ddl, format) {
        Ok(deadline) => return Ok(deadline),
        Err(err) => err,
    };

    let fields = TimeFields::of(format);
    let fallback = if !fields.hour && !fields.minute {
        NaiveDate::parse_from_str(ddl, format)
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN))
    } else if fields.hour && !fields.minute {
        NaiveDateTime::parse_from_str(&format!("{} 00", ddl), &format!("{} %M", format)).ok()
    } else {
        None
    };

    fallback.ok_or_else(|| ConfigError::Deadline {
        ddl: ddl.to_string(),
        format: format.to_string(),
        source: err,
    })
}

/// Which time-of-day fields a strftime pattern sets.
struct TimeFields {
    hour: bool,
    minute: bool,
}

impl TimeFields {
    fn of(format: &str) -> Self {
        let mut fields = Self {
            hour: false,
            minute: false,
        };
        for item in StrftimeItems::new(format) {
            match item {
                Item::Numeric(Numeric::Hour | Numeric::Hour12, _) => fields.hour = true,
                Item::Numeric(Numeric::Minute, _) => fields.minute = true,
                _ => {}
            }
        }
        fields
    }
}

/// Whole seconds between `now` and `deadline`; nothing left counts as overdue.
pub fn remaining(deadline: NaiveDateTime, now: NaiveDateTime) -> Remaining {
    let secs = (deadline - now).num_seconds();
    if secs > 0 {
        Remaining::Left(Duration::from_secs(secs as u64))
    } else {
        Remaining::Overdue
    }
}
