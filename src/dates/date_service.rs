use super::at_hour;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How close a due date is
///
/// Ordered from most to least pressing so that sorting by level puts overdue
/// work first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    /// Due date has passed
    Overdue,
    /// Due within 24 hours
    Urgent,
    /// Due within 3 days
    Warning,
    /// Anything else, including no due date
    Normal,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Overdue => "overdue",
            UrgencyLevel::Urgent => "urgent",
            UrgencyLevel::Warning => "warning",
            UrgencyLevel::Normal => "normal",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrgencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overdue" => Ok(UrgencyLevel::Overdue),
            "urgent" => Ok(UrgencyLevel::Urgent),
            "warning" => Ok(UrgencyLevel::Warning),
            "normal" => Ok(UrgencyLevel::Normal),
            _ => Err(format!(
                "Invalid urgency level '{}'. Valid options are: overdue, urgent, warning, normal",
                s
            )),
        }
    }
}

/// Classify a due date relative to `now`
///
/// Exactly 24 hours away is still `Urgent`, and anything up to three whole
/// days away is `Warning`.
pub fn urgency_level(due_date: Option<NaiveDateTime>, now: NaiveDateTime) -> UrgencyLevel {
    let Some(due) = due_date else {
        return UrgencyLevel::Normal;
    };

    let delta = due - now;
    if delta < Duration::zero() {
        UrgencyLevel::Overdue
    } else if delta <= Duration::hours(24) {
        UrgencyLevel::Urgent
    } else if delta.num_days() <= 3 {
        UrgencyLevel::Warning
    } else {
        UrgencyLevel::Normal
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Human readable remaining time
///
/// Completed items show their completion stamp instead. Far-off dates use the
/// `D-N` countdown form.
pub fn time_remaining_text(
    due_date: Option<NaiveDateTime>,
    completed_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> String {
    let Some(due) = due_date else {
        return String::new();
    };

    if let Some(done) = completed_at {
        return format!("Done: {}", done.format("%m/%d %H:%M"));
    }

    let delta = due - now;
    if delta < Duration::zero() {
        let late = -delta;
        return if late.num_days() > 0 {
            format!("{} overdue", plural(late.num_days(), "day"))
        } else if late.num_hours() > 0 {
            format!("{} overdue", plural(late.num_hours(), "hour"))
        } else {
            format!("{} overdue", plural(late.num_minutes(), "minute"))
        };
    }

    if delta <= Duration::hours(24) {
        if delta <= Duration::hours(1) {
            let minutes = delta.num_minutes();
            if minutes <= 0 {
                return "Due soon".to_string();
            }
            return format!("{} left", plural(minutes, "minute"));
        }
        return format!("{} left", plural(delta.num_hours(), "hour"));
    }

    match delta.num_days() {
        0 => "D-day".to_string(),
        days => format!("D-{}", days),
    }
}

/// Output style for `format_due_date`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// "Today 18:00", "Tomorrow 09:30", otherwise "MM/DD HH:MM"
    #[default]
    Relative,
    /// "YYYY-MM-DD HH:MM"
    Absolute,
    /// "MM/DD"
    Short,
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relative" => Ok(DateFormat::Relative),
            "absolute" => Ok(DateFormat::Absolute),
            "short" => Ok(DateFormat::Short),
            _ => Err(format!(
                "Invalid date format '{}'. Valid options are: relative, absolute, short",
                s
            )),
        }
    }
}

pub fn format_due_date(
    due_date: Option<NaiveDateTime>,
    format: DateFormat,
    now: NaiveDateTime,
) -> String {
    let Some(due) = due_date else {
        return String::new();
    };

    match format {
        DateFormat::Relative => {
            let today = now.date();
            let day = due.date();
            let time = due.format("%H:%M");
            if day == today {
                format!("Today {}", time)
            } else if today.succ_opt() == Some(day) {
                format!("Tomorrow {}", time)
            } else if today.pred_opt() == Some(day) {
                format!("Yesterday {}", time)
            } else {
                due.format("%m/%d %H:%M").to_string()
            }
        }
        DateFormat::Absolute => due.format("%Y-%m-%d %H:%M").to_string(),
        DateFormat::Short => due.format("%m/%d").to_string(),
    }
}

/// Both timestamps fall on the same calendar date
pub fn is_same_day(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date()
}

/// Reasons a due date is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DueDateError {
    #[error("Due date is too far in the past. Pick a time from now on.")]
    TooFarInPast,
    #[error("Due date is too far in the future. Pick a date within 10 years.")]
    TooFarInFuture,
    #[error("A subtask must be due no later than its todo ({parent}).")]
    AfterParent { parent: String },
}

/// Check a due date before it is stored
///
/// Up to one hour in the past is tolerated so that "now" typed a minute ago is
/// still accepted. A subtask may share its parent's due date but not exceed it.
pub fn validate_due_date(
    due: NaiveDateTime,
    parent_due: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Result<(), DueDateError> {
    if due < now - Duration::hours(1) {
        return Err(DueDateError::TooFarInPast);
    }

    if due > now + Duration::days(3650) {
        return Err(DueDateError::TooFarInFuture);
    }

    if let Some(parent) = parent_due
        && due > parent
    {
        return Err(DueDateError::AfterParent {
            parent: format_due_date(Some(parent), DateFormat::Relative, now),
        });
    }

    Ok(())
}

/// Next Saturday; a week ahead when today already is Saturday
fn this_weekend(today: NaiveDate) -> NaiveDate {
    let from_monday = i64::from(today.weekday().num_days_from_monday());
    let saturday = i64::from(Weekday::Sat.num_days_from_monday());
    let mut days = (saturday - from_monday).rem_euclid(7);
    if days == 0 {
        days = 7;
    }
    today + Duration::days(days)
}

/// Preset due dates offered by the menu and the `due` command
pub fn quick_date_options(now: NaiveDateTime, hour: u32) -> Vec<(&'static str, NaiveDateTime)> {
    let today = now.date();
    let base = at_hour(today, hour);

    vec![
        ("Today", base),
        ("Tomorrow", base + Duration::days(1)),
        ("Day after tomorrow", base + Duration::days(2)),
        ("This weekend", at_hour(this_weekend(today), hour)),
        ("Next week", base + Duration::days(7)),
        ("In 1 week", base + Duration::days(7)),
        ("In 2 weeks", base + Duration::days(14)),
        ("In 1 month", base + Duration::days(30)),
    ]
}

/// Inclusive range of timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Ranges used by the due date filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRanges {
    pub today: DateRange,
    pub tomorrow: DateRange,
    /// Monday 00:00 through Sunday 23:59:59.999999
    pub this_week: DateRange,
    pub this_month: DateRange,
    /// Everything before now
    pub overdue: DateRange,
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn day_range(date: NaiveDate) -> DateRange {
    let start = start_of_day(date);
    DateRange {
        start,
        end: start + Duration::days(1) - Duration::microseconds(1),
    }
}

pub fn date_filter_ranges(now: NaiveDateTime) -> DateRanges {
    let today = now.date();

    let week_start = start_of_day(
        today - Duration::days(i64::from(today.weekday().num_days_from_monday())),
    );
    let this_week = DateRange {
        start: week_start,
        end: week_start + Duration::days(7) - Duration::microseconds(1),
    };

    let month_first = today.with_day(1).unwrap_or(today);
    let next_month_first = if month_first.month() == 12 {
        NaiveDate::from_ymd_opt(month_first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month_first.year(), month_first.month() + 1, 1)
    }
    .unwrap_or(month_first + Duration::days(31));
    let this_month = DateRange {
        start: start_of_day(month_first),
        end: start_of_day(next_month_first) - Duration::microseconds(1),
    };

    DateRanges {
        today: day_range(today),
        tomorrow: day_range(today + Duration::days(1)),
        this_week,
        this_month,
        overdue: DateRange {
            start: NaiveDateTime::MIN,
            end: now,
        },
    }
}
