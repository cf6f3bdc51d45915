//! Due date logic
//!
//! - `date_service`: urgency classification, remaining-time text, due date
//!   formatting and validation, quick picks and filter ranges
//! - `date_utils`: free-form date input parsing and general date arithmetic
//!
//! Every function takes the current time explicitly; `local_now()` supplies it
//! outside of tests.

mod date_service;
mod date_utils;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

pub use date_service::{
    DateFormat, DateRange, DateRanges, DueDateError, UrgencyLevel, date_filter_ranges,
    format_due_date, is_same_day, quick_date_options, time_remaining_text, urgency_level,
    validate_due_date,
};
pub use date_utils::{
    DateRangeError, MAX_RANGE_DAYS, business_days_between, format_duration, is_weekend, next_weekday,
    parse_user_date_input, relative_time_text, validate_date_range,
};

/// Current local time without timezone, matching how timestamps are stored
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// `date` at `hour`:00:00, clamping out-of-range hours to midnight
pub(crate) fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN))
}
