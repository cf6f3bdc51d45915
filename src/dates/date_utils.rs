use super::at_hour;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use thiserror::Error;

/// "3 days from now", "2 hours ago", "just now"
pub fn relative_time_text(target: NaiveDateTime, reference: NaiveDateTime) -> String {
    let delta = target - reference;

    if delta > Duration::zero() {
        if delta.num_days() > 0 {
            format!("{} from now", unit(delta.num_days(), "day"))
        } else if delta.num_hours() > 0 {
            format!("{} from now", unit(delta.num_hours(), "hour"))
        } else if delta.num_minutes() > 0 {
            format!("{} from now", unit(delta.num_minutes(), "minute"))
        } else {
            "soon".to_string()
        }
    } else {
        let past = -delta;
        if past.num_days() > 0 {
            format!("{} ago", unit(past.num_days(), "day"))
        } else if past.num_hours() > 0 {
            format!("{} ago", unit(past.num_hours(), "hour"))
        } else if past.num_minutes() > 0 {
            format!("{} ago", unit(past.num_minutes(), "minute"))
        } else {
            "just now".to_string()
        }
    }
}

fn unit(count: i64, name: &str) -> String {
    if count == 1 {
        format!("1 {}", name)
    } else {
        format!("{} {}s", count, name)
    }
}

/// Parse a 1-2 digit number
fn small_number(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// "MM/DD" -> (month, day)
fn month_day(s: &str) -> Option<(u32, u32)> {
    let (m, d) = s.split_once('/')?;
    Some((small_number(m)?, small_number(d)?))
}

/// "HH:MM" -> (hour, minute); minutes must be two digits
fn hour_minute(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    if m.len() != 2 {
        return None;
    }
    Some((small_number(h)?, small_number(m)?))
}

/// "15d" / "15일" -> 15
fn day_of_month(s: &str) -> Option<u32> {
    small_number(s.strip_suffix('d').or_else(|| s.strip_suffix('일'))?)
}

/// "18h" / "18시" -> 18
fn hour_of_day(s: &str) -> Option<u32> {
    small_number(s.strip_suffix('h').or_else(|| s.strip_suffix('시'))?)
}

/// A month/day in the current year, or next year once it has passed
fn upcoming_month_day(
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let candidate = NaiveDate::from_ymd_opt(now.year(), month, day)?.and_hms_opt(hour, minute, 0)?;
    if candidate < now {
        NaiveDate::from_ymd_opt(now.year() + 1, month, day)?.and_hms_opt(hour, minute, 0)
    } else {
        Some(candidate)
    }
}

/// A day in the current month, or next month once it has passed
fn upcoming_day(day: u32, hour: u32, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let candidate = NaiveDate::from_ymd_opt(now.year(), now.month(), day)?.and_hms_opt(hour, 0, 0)?;
    if candidate >= now {
        return Some(candidate);
    }
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}

/// Parse a due date typed by a user
///
/// Accepted forms:
/// - `today`, `tomorrow`, `day after tomorrow` (also `오늘`, `내일`, `모레`) at `default_hour`
/// - `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD`
/// - `MM/DD HH:MM`, `MM/DD` (next year once passed)
/// - `15d 18h`, `15d` (also `15일 18시`, `15일`; next month once passed)
///
/// Impossible calendar dates such as `02/30` yield `None`.
pub fn parse_user_date_input(
    input: &str,
    now: NaiveDateTime,
    default_hour: u32,
) -> Option<NaiveDateTime> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    let today = now.date();
    match text.to_lowercase().as_str() {
        "today" | "오늘" => return Some(at_hour(today, default_hour)),
        "tomorrow" | "내일" => return Some(at_hour(today + Duration::days(1), default_hour)),
        "day after tomorrow" | "모레" => {
            return Some(at_hour(today + Duration::days(2), default_hour));
        }
        _ => {}
    }

    let iso = text.replacen('T', " ", 1);
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&iso, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(at_hour(date, default_hour));
    }

    let parts: Vec<&str> = text.split_whitespace().collect();
    match parts.as_slice() {
        [date, time] => {
            if let (Some((month, day)), Some((hour, minute))) = (month_day(date), hour_minute(time))
            {
                return upcoming_month_day(month, day, hour, minute, now);
            }
            if let (Some(day), Some(hour)) = (day_of_month(date), hour_of_day(time)) {
                return upcoming_day(day, hour, now);
            }
            None
        }
        [single] => {
            if let Some((month, day)) = month_day(single) {
                return upcoming_month_day(month, day, default_hour, 0, now);
            }
            if let Some(day) = day_of_month(single) {
                return upcoming_day(day, default_hour, now);
            }
            None
        }
        _ => None,
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays between two timestamps, counting both end dates
pub fn business_days_between(start: NaiveDateTime, end: NaiveDateTime) -> u32 {
    if start > end {
        return 0;
    }

    start
        .date()
        .iter_days()
        .take_while(|d| *d <= end.date())
        .filter(|d| !is_weekend(*d))
        .count() as u32
}

/// Compact duration: "1d 2h", "2h 5m", "45s"
///
/// Minutes are dropped once days are shown and seconds once hours are shown.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    if total <= 0 {
        return "0s".to_string();
    }

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 && days == 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 && days == 0 && hours == 0 {
        parts.push(format!("{}s", seconds));
    }

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// The next `weekday` strictly after `from`, keeping the time of day
pub fn next_weekday(from: NaiveDateTime, weekday: Weekday) -> NaiveDateTime {
    let current = i64::from(from.weekday().num_days_from_monday());
    let target = i64::from(weekday.num_days_from_monday());
    let mut ahead = target - current;
    if ahead <= 0 {
        ahead += 7;
    }
    from + Duration::days(ahead)
}

/// Longest span, in days, a date range query may cover
pub const MAX_RANGE_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("Start date is after the end date.")]
    Reversed,
    #[error("Date range is too long. Keep it within one year.")]
    TooLong,
}

pub fn validate_date_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), DateRangeError> {
    if start > end {
        return Err(DateRangeError::Reversed);
    }
    if (end - start).num_days() > MAX_RANGE_DAYS {
        return Err(DateRangeError::TooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_relative_time_text() {
        let now = at(2025, 1, 15, 12, 0);
        assert_eq!(relative_time_text(now + Duration::days(2), now), "2 days from now");
        assert_eq!(relative_time_text(now + Duration::hours(1), now), "1 hour from now");
        assert_eq!(relative_time_text(now + Duration::minutes(5), now), "5 minutes from now");
        assert_eq!(relative_time_text(now + Duration::seconds(10), now), "soon");
        assert_eq!(relative_time_text(now, now), "just now");
        assert_eq!(relative_time_text(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_time_text(now - Duration::hours(3), now), "3 hours ago");
    }

    #[test]
    fn test_parse_keywords() {
        let now = at(2025, 1, 15, 12, 0);
        assert_eq!(parse_user_date_input("  today ", now, 18), Some(at(2025, 1, 15, 18, 0)));
        assert_eq!(parse_user_date_input("Tomorrow", now, 18), Some(at(2025, 1, 16, 18, 0)));
        assert_eq!(parse_user_date_input("모레", now, 9), Some(at(2025, 1, 17, 9, 0)));
        assert_eq!(parse_user_date_input("", now, 18), None);
        assert_eq!(parse_user_date_input("someday", now, 18), None);
    }

    #[test]
    fn test_parse_iso_forms() {
        let now = at(2025, 1, 15, 12, 0);
        assert_eq!(
            parse_user_date_input("2025-03-01 09:30", now, 18),
            Some(at(2025, 3, 1, 9, 30))
        );
        assert_eq!(
            parse_user_date_input("2025-03-01T09:30:00", now, 18),
            Some(at(2025, 3, 1, 9, 30))
        );
        assert_eq!(
            parse_user_date_input("2025-03-01", now, 18),
            Some(at(2025, 3, 1, 18, 0))
        );
    }

    #[test]
    fn test_parse_month_day_rolls_to_next_year() {
        let now = at(2025, 6, 15, 12, 0);
        assert_eq!(
            parse_user_date_input("07/01 10:00", now, 18),
            Some(at(2025, 7, 1, 10, 0))
        );
        assert_eq!(
            parse_user_date_input("01/31", now, 18),
            Some(at(2026, 1, 31, 18, 0))
        );
    }

    #[test]
    fn test_parse_invalid_calendar_date() {
        let now = at(2025, 1, 1, 0, 0);
        assert_eq!(parse_user_date_input("02/29", now, 18), None);
        assert_eq!(parse_user_date_input("13/01", now, 18), None);
        assert_eq!(parse_user_date_input("01/15 25:00", now, 18), None);
    }

    #[test]
    fn test_parse_day_of_month_rolls_to_next_month() {
        let now = at(2025, 12, 20, 12, 0);
        assert_eq!(parse_user_date_input("25d", now, 18), Some(at(2025, 12, 25, 18, 0)));
        assert_eq!(parse_user_date_input("10일 9시", now, 18), Some(at(2026, 1, 10, 9, 0)));
    }

    #[test]
    fn test_business_days_between() {
        // 2025-01-15 は水曜日
        let wednesday = at(2025, 1, 15, 0, 0);
        assert_eq!(business_days_between(wednesday, wednesday), 1);
        assert_eq!(business_days_between(at(2025, 1, 18, 0, 0), at(2025, 1, 19, 0, 0)), 0);
        assert_eq!(business_days_between(wednesday, at(2025, 1, 21, 0, 0)), 5);
        assert_eq!(business_days_between(at(2025, 1, 20, 0, 0), wednesday), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::zero()), "0s");
        assert_eq!(format_duration(Duration::seconds(-3600)), "0s");
        assert_eq!(format_duration(Duration::seconds(45)), "45s");
        assert_eq!(format_duration(Duration::minutes(125)), "2h 5m");
        assert_eq!(
            format_duration(Duration::days(365) + Duration::hours(12) + Duration::minutes(30)),
            "365d 12h"
        );
    }

    #[test]
    fn test_next_weekday_is_strictly_after() {
        let wednesday = at(2025, 1, 15, 9, 0);
        assert_eq!(next_weekday(wednesday, Weekday::Fri), at(2025, 1, 17, 9, 0));
        assert_eq!(next_weekday(wednesday, Weekday::Wed), at(2025, 1, 22, 9, 0));
        assert_eq!(next_weekday(wednesday, Weekday::Mon), at(2025, 1, 20, 9, 0));
    }

    #[test]
    fn test_validate_date_range() {
        let start = at(2025, 1, 1, 0, 0);
        assert_eq!(validate_date_range(start, start + Duration::days(30)), Ok(()));
        assert_eq!(
            validate_date_range(start + Duration::days(1), start),
            Err(DateRangeError::Reversed)
        );
        assert_eq!(
            validate_date_range(start, start + Duration::days(400)),
            Err(DateRangeError::TooLong)
        );
    }
}
