//! Week anchoring and date formatting.
//!
//! Every date that enters the engine goes through [`WeekAnchor::week_monday`] so that
//! callers passing full timestamps and callers passing plain dates agree on the week.
//! Weeks run Sunday through Saturday: a Sunday anchors to the Monday after it,
//! every other day to the Monday on or before it.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, TimeZone, Weekday};

/// Anything that can be reduced to the Monday of its week.
pub trait WeekAnchor {
    /// The calendar date, with any time of day stripped.
    fn calendar_date(&self) -> NaiveDate;

    /// The Monday anchoring this date's week.
    fn week_monday(&self) -> NaiveDate {
        normalize(self.calendar_date())
    }
}

impl WeekAnchor for NaiveDate {
    fn calendar_date(&self) -> NaiveDate {
        *self
    }
}

impl WeekAnchor for NaiveDateTime {
    fn calendar_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> WeekAnchor for DateTime<Tz> {
    /// Truncates in the timestamp's own offset, so "Monday 00:00-07:00" stays a Monday.
    fn calendar_date(&self) -> NaiveDate {
        self.date_naive()
    }
}

impl<T: WeekAnchor + ?Sized> WeekAnchor for &T {
    fn calendar_date(&self) -> NaiveDate {
        (**self).calendar_date()
    }
}

/// Roll a date to the Monday of its (Sunday-first) week.
pub fn normalize(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sun => date + Days::new(1),
        other => date - Days::new(u64::from(other.num_days_from_monday())),
    }
}

/// Add whole weeks to a date.
pub fn add_weeks(date: NaiveDate, weeks: u64) -> NaiveDate {
    date + Days::new(weeks * 7)
}

/// The next upcoming Monday as seen from `today`.
///
/// That is today's Monday when today is Monday (or a Sunday, which already rolls
/// forward), otherwise the Monday of the following week.
pub fn upcoming_monday(today: NaiveDate) -> NaiveDate {
    let monday = normalize(today);
    if today > monday {
        add_weeks(monday, 1)
    } else {
        monday
    }
}

/// Format a date as `Jun 12th`.
pub fn format_day(date: NaiveDate) -> String {
    format!("{} {}{}", date.format("%b"), date.day(), ordinal_suffix(date.day()))
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Source of "today" for the engine.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock reading the deployment's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_normalize_is_idempotent_monday() {
        let mut date = d(2024, 1, 1);
        for _ in 0..400 {
            let monday = normalize(date);
            assert_eq!(monday.weekday(), Weekday::Mon, "{date} -> {monday}");
            assert_eq!(normalize(monday), monday);
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_normalize_rolls_backward_midweek() {
        // 2024-06-05 is a Wednesday
        assert_eq!(normalize(d(2024, 6, 5)), d(2024, 6, 3));
        assert_eq!(normalize(d(2024, 6, 8)), d(2024, 6, 3));
    }

    #[test]
    fn test_normalize_rolls_sunday_forward() {
        assert_eq!(normalize(d(2024, 6, 9)), d(2024, 6, 10));
    }

    #[test]
    fn test_timestamps_and_dates_agree() {
        let ts = FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 5, 23, 30, 0)
            .unwrap();
        assert_eq!(ts.week_monday(), d(2024, 6, 5).week_monday());
        let naive = d(2024, 6, 5).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(naive.week_monday(), d(2024, 6, 3));
    }

    #[test]
    fn test_upcoming_monday() {
        assert_eq!(upcoming_monday(d(2024, 6, 3)), d(2024, 6, 3));
        assert_eq!(upcoming_monday(d(2024, 6, 5)), d(2024, 6, 10));
        assert_eq!(upcoming_monday(d(2024, 6, 9)), d(2024, 6, 10));
    }

    #[test]
    fn test_format_day() {
        assert_eq!(format_day(d(2024, 6, 1)), "Jun 1st");
        assert_eq!(format_day(d(2024, 6, 12)), "Jun 12th");
        assert_eq!(format_day(d(2024, 6, 22)), "Jun 22nd");
        assert_eq!(format_day(d(2024, 7, 3)), "Jul 3rd");
        assert_eq!(format_day(d(2024, 7, 11)), "Jul 11th");
    }
}
