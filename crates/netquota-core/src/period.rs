// ── Accounting period scheduling ──
//
// Periods are anchored to a day of the month. A start day past the end of a
// short month falls on that month's last day, so a "31st" period resets on
// Feb 28/29, Apr 30, and so on.

use chrono::{Datelike, Local, NaiveDate};

/// Source of "today" for the scheduler.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The host's local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Number of days in the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(28, |last| last.day())
}

/// The reset date that falls in the same month as `today`.
pub fn reset_date_for(today: NaiveDate, period_start_day: u32) -> NaiveDate {
    let day = period_start_day.clamp(1, last_day_of_month(today));
    today.with_day(day).unwrap_or(today)
}

/// Whether the period boundary for the current month has been crossed
/// since `last_reset`.
///
/// True iff `last_reset < reset_date <= today`. A missing `last_reset` means
/// the state was never reset (or the stored date was unreadable), which
/// always triggers a reset. Once `last_reset` moves to a date on or after
/// this month's reset date, further calls in the same period return false.
pub fn should_reset(
    today: NaiveDate,
    last_reset: Option<NaiveDate>,
    period_start_day: u32,
) -> bool {
    let Some(last_reset) = last_reset else {
        return true;
    };
    let reset_date = reset_date_for(today, period_start_day);
    last_reset < reset_date && reset_date <= today
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::NaiveDate;

    use super::{last_day_of_month, reset_date_for, should_reset};
    use crate::model::AccountingState;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_lengths() {
        assert_eq!(last_day_of_month(date(2024, 1, 15)), 31);
        assert_eq!(last_day_of_month(date(2024, 2, 1)), 29);
        assert_eq!(last_day_of_month(date(2023, 2, 1)), 28);
        assert_eq!(last_day_of_month(date(2024, 4, 30)), 30);
        assert_eq!(last_day_of_month(date(2024, 12, 31)), 31);
    }

    #[test]
    fn start_day_clamps_to_short_months() {
        assert_eq!(reset_date_for(date(2024, 4, 10), 31), date(2024, 4, 30));
        assert_eq!(reset_date_for(date(2023, 2, 10), 31), date(2023, 2, 28));
        assert_eq!(reset_date_for(date(2024, 2, 10), 30), date(2024, 2, 29));
        assert_eq!(reset_date_for(date(2024, 5, 10), 0), date(2024, 5, 1));
    }

    #[test]
    fn day_31_in_30_day_month_resets_on_the_30th() {
        let last = Some(date(2024, 3, 31));
        assert!(!should_reset(date(2024, 4, 29), last, 31));
        assert!(should_reset(date(2024, 4, 30), last, 31));
    }

    #[test]
    fn missing_last_reset_forces_reset() {
        assert!(should_reset(date(2024, 6, 15), None, 1));
    }

    #[test]
    fn no_reset_before_the_boundary() {
        let last = Some(date(2024, 5, 10));
        assert!(!should_reset(date(2024, 6, 9), last, 10));
        assert!(should_reset(date(2024, 6, 10), last, 10));
    }

    #[test]
    fn reset_detected_late_when_polling_resumes_after_boundary() {
        // Daemon was down across the boundary.
        let last = Some(date(2024, 5, 10));
        assert!(should_reset(date(2024, 6, 27), last, 10));
    }

    #[test]
    fn second_check_after_reset_is_false() {
        let today = date(2024, 6, 10);
        let mut state = AccountingState {
            last_reset: Some(date(2024, 5, 10)),
            ..AccountingState::default()
        };

        assert!(should_reset(today, state.last_reset, 10));
        state.reset(today);
        assert!(!should_reset(today, state.last_reset, 10));
        assert!(!should_reset(date(2024, 6, 30), state.last_reset, 10));
        assert!(should_reset(date(2024, 7, 10), state.last_reset, 10));
    }

    #[test]
    fn reset_recorded_mid_period_does_not_repeat() {
        // First start on the 20th resets immediately (no last_reset) and
        // stamps the 20th; the 10th of the same month is already behind us.
        let today = date(2024, 6, 20);
        assert!(should_reset(today, None, 10));
        assert!(!should_reset(date(2024, 6, 21), Some(today), 10));
    }
}
