//! Lightweight cron expression engine.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds)
//! Field syntax: *, */N, N, N-M, and comma lists of numbers/ranges.
//! Weekdays run 0-7 with both 0 and 7 meaning Sunday.
//! Example: "0 8 * * 1-5" = weekday mornings at 8:00.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use thiserror::Error;

/// Why an expression failed to parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronParseError {
    #[error("expected 5 fields (minute hour day month weekday), found {0}")]
    FieldCount(usize),
    #[error("invalid {field} field '{value}'")]
    Field { field: &'static str, value: String },
}

/// One parsed field: sorted matching values, plus whether it was `*`.
/// Wildcard-ness matters for the day rule, not for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CronField {
    values: Vec<u32>,
    wildcard: bool,
}

impl CronField {
    fn contains(&self, value: u32) -> bool {
        self.values.contains(&value)
    }
}

/// A validated 5-field cron schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minutes: CronField,
    hours: CronField,
    days: CronField,
    months: CronField,
    weekdays: CronField,
}

impl CronSchedule {
    /// Parse and validate an expression. Every field is checked up front so
    /// a bad schedule is rejected at registration, not at fire time.
    pub fn parse(expression: &str) -> Result<Self, CronParseError> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(CronParseError::FieldCount(parts.len()));
        }
        Ok(Self {
            minutes: parse_field(parts[0], "minute", 0, 59)?,
            hours: parse_field(parts[1], "hour", 0, 23)?,
            days: parse_field(parts[2], "day", 1, 31)?,
            months: parse_field(parts[3], "month", 1, 12)?,
            weekdays: parse_weekday_field(parts[4])?,
        })
    }

    /// Next fire time strictly after `after`, on a whole minute.
    ///
    /// Scans forward a minute at a time, skipping whole days that cannot
    /// match. Bounded at eight years: that covers the longest stretch
    /// between leap days (2096-02-29 to 2104-02-29, across the skipped
    /// 2100), so `0 0 29 2 *` always resolves, while an unsatisfiable
    /// combination (like `0 0 31 2 *`) returns `None` instead of looping
    /// forever.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut candidate = (after + Duration::minutes(1))
            .with_second(0)?
            .with_nanosecond(0)?;
        let horizon = after + Duration::days(8 * 366);

        while candidate <= horizon {
            if !self.day_matches(candidate) {
                let next_day = candidate.date_naive().succ_opt()?;
                candidate = next_day.and_hms_opt(0, 0, 0)?.and_utc();
                continue;
            }
            if self.hours.contains(candidate.hour()) && self.minutes.contains(candidate.minute()) {
                return Some(candidate);
            }
            candidate += Duration::minutes(1);
        }
        None
    }

    /// Standard Vixie day rule: with both day-of-month and day-of-week
    /// restricted, a day matching either fires; with one restricted, that
    /// one decides.
    fn day_matches(&self, at: DateTime<Utc>) -> bool {
        if !self.months.contains(at.month()) {
            return false;
        }
        let dom = self.days.contains(at.day());
        let dow = self.weekdays.contains(at.weekday().num_days_from_sunday());
        match (self.days.wildcard, self.weekdays.wildcard) {
            (false, false) => dom || dow,
            (false, true) => dom,
            (true, false) => dow,
            (true, true) => true,
        }
    }
}

/// Parse one cron field into its matching values.
fn parse_field(
    field: &str,
    name: &'static str,
    min: u32,
    max: u32,
) -> Result<CronField, CronParseError> {
    let invalid = || CronParseError::Field {
        field: name,
        value: field.to_string(),
    };

    if field == "*" {
        return Ok(CronField {
            values: (min..=max).collect(),
            wildcard: true,
        });
    }

    // */N — every N across the full range
    if let Some(step) = field.strip_prefix("*/") {
        let n: u32 = step.parse().map_err(|_| invalid())?;
        if n == 0 {
            return Err(invalid());
        }
        return Ok(CronField {
            values: (min..=max).step_by(n as usize).collect(),
            wildcard: false,
        });
    }

    // Comma list of numbers and ranges: "0,15,30-35,45"
    let mut values = Vec::new();
    for part in field.split(',') {
        let part = part.trim();
        if let Some((lo, hi)) = part.split_once('-') {
            let lo: u32 = lo.parse().map_err(|_| invalid())?;
            let hi: u32 = hi.parse().map_err(|_| invalid())?;
            if lo > hi || lo < min || hi > max {
                return Err(invalid());
            }
            values.extend(lo..=hi);
        } else {
            let n: u32 = part.parse().map_err(|_| invalid())?;
            if n < min || n > max {
                return Err(invalid());
            }
            values.push(n);
        }
    }
    values.sort_unstable();
    values.dedup();
    Ok(CronField {
        values,
        wildcard: false,
    })
}

/// Weekday field with the 0/7 Sunday alias folded to 0.
fn parse_weekday_field(field: &str) -> Result<CronField, CronParseError> {
    let mut parsed = parse_field(field, "weekday", 0, 7)?;
    for v in &mut parsed.values {
        if *v == 7 {
            *v = 0;
        }
    }
    parsed.values.sort_unstable();
    parsed.values.dedup();
    Ok(parsed)
}
