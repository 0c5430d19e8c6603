//! Calendar arithmetic for stepping a recurrence forward by one occurrence.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::{RecurrenceRule, RecurrenceType};

/// Returns true for Gregorian leap years.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Builds `year-month-day`, pulling `day` back to the month's last day when
/// the month is shorter.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, days_in_month(year, month).max(1));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Computes the occurrence that follows `current` under `rule`.
///
/// Pure and deterministic. The rule is assumed to have passed
/// [`validate_rule`](super::validate_rule). Returns `None` only when the
/// result falls outside the representable calendar.
///
/// - daily: `current + interval` days
/// - weekly: `current + 7 * interval` days, then forward 0-6 days onto
///   `day_of_week` when it is set
/// - monthly: `interval` months later on `day_of_month` (or the day of
///   `current`), clamped to the month's length
/// - yearly: `interval` years later in `month_of_year` (or the month of
///   `current`) on `day_of_month` (or the day of `current`), clamped
pub fn next_occurrence(current: NaiveDate, rule: &RecurrenceRule) -> Option<NaiveDate> {
    let interval = rule.interval as u64;

    match rule.recurrence_type {
        RecurrenceType::Daily => current.checked_add_days(Days::new(interval)),
        RecurrenceType::Weekly => {
            let base = current.checked_add_days(Days::new(interval * 7))?;
            match rule.day_of_week {
                Some(weekday) => align_to_weekday(base, weekday),
                None => Some(base),
            }
        }
        RecurrenceType::Monthly => {
            let months = current.year() as i64 * 12 + current.month0() as i64 + interval as i64;
            let year = i32::try_from(months.div_euclid(12)).ok()?;
            let month = months.rem_euclid(12) as u32 + 1;
            let day = rule.day_of_month.map(u32::from).unwrap_or(current.day());
            clamped_date(year, month, day)
        }
        RecurrenceType::Yearly => {
            let year = current.year().checked_add(i32::try_from(interval).ok()?)?;
            let month = rule.month_of_year.map(u32::from).unwrap_or(current.month());
            let day = rule.day_of_month.map(u32::from).unwrap_or(current.day());
            clamped_date(year, month, day)
        }
    }
}

/// The first date on or after `date` falling on `day_of_week` (0 = Sunday).
pub fn align_to_weekday(date: NaiveDate, day_of_week: u8) -> Option<NaiveDate> {
    let current = date.weekday().num_days_from_sunday();
    let shift = (u32::from(day_of_week) + 7 - current) % 7;
    date.checked_add_days(Days::new(shift as u64))
}

/// The first occurrence of a series that begins at `start_date`.
///
/// A weekly rule anchored to a weekday starts on the first such weekday on or
/// after `start_date`; every other rule starts on `start_date` itself.
pub fn first_occurrence(start_date: NaiveDate, rule: &RecurrenceRule) -> Option<NaiveDate> {
    match (rule.recurrence_type, rule.day_of_week) {
        (RecurrenceType::Weekly, Some(weekday)) => align_to_weekday(start_date, weekday),
        _ => Some(start_date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(2024, true)]
    #[case(2023, false)]
    #[case(1900, false)]
    #[case(2000, true)]
    fn test_is_leap_year(#[case] year: i32, #[case] expected: bool) {
        assert_eq!(is_leap_year(year), expected);
    }

    #[rstest]
    #[case(2024, 2, 29)]
    #[case(2023, 2, 28)]
    #[case(2024, 4, 30)]
    #[case(2024, 12, 31)]
    fn test_days_in_month(#[case] year: i32, #[case] month: u32, #[case] expected: u32) {
        assert_eq!(days_in_month(year, month), expected);
    }

    #[rstest]
    #[case(date(2024, 1, 1), 1, date(2024, 1, 2))]
    #[case(date(2024, 2, 28), 1, date(2024, 2, 29))]
    #[case(date(2023, 12, 30), 3, date(2024, 1, 2))]
    fn test_daily(#[case] current: NaiveDate, #[case] interval: u32, #[case] expected: NaiveDate) {
        assert_eq!(next_occurrence(current, &RecurrenceRule::daily(interval)), Some(expected));
    }

    #[test]
    fn test_weekly_without_anchor() {
        let rule = RecurrenceRule::weekly(2);
        assert_eq!(next_occurrence(date(2024, 1, 1), &rule), Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_weekly_shifts_onto_anchor() {
        // 2024-01-01 is a Monday; +7 days is Monday the 8th, Wednesday follows.
        let rule = RecurrenceRule::weekly(1).on_weekday(3);
        let next = next_occurrence(date(2024, 1, 1), &rule).unwrap();
        assert_eq!(next, date(2024, 1, 10));
        assert_eq!(next.weekday(), Weekday::Wed);
    }

    #[test]
    fn test_weekly_anchor_already_matching() {
        let rule = RecurrenceRule::weekly(1).on_weekday(3);
        assert_eq!(next_occurrence(date(2024, 1, 3), &rule), Some(date(2024, 1, 10)));
    }

    #[test]
    fn test_weekly_interval_two_keeps_documented_computation() {
        // Wednesday + 14 days lands on a Wednesday; Thursday + 14 days then
        // shifts six days onto the following Wednesday.
        let rule = RecurrenceRule::weekly(2).on_weekday(3);
        assert_eq!(next_occurrence(date(2024, 1, 3), &rule), Some(date(2024, 1, 17)));
        assert_eq!(next_occurrence(date(2024, 1, 4), &rule), Some(date(2024, 1, 24)));
    }

    #[rstest]
    #[case(date(2024, 3, 31), 31, date(2024, 4, 30))]
    #[case(date(2024, 1, 31), 31, date(2024, 2, 29))]
    #[case(date(2023, 1, 31), 31, date(2023, 2, 28))]
    #[case(date(2024, 1, 10), 15, date(2024, 2, 15))]
    fn test_monthly_with_anchor(
        #[case] current: NaiveDate,
        #[case] day: u8,
        #[case] expected: NaiveDate,
    ) {
        let rule = RecurrenceRule::monthly(1).on_day(day);
        assert_eq!(next_occurrence(current, &rule), Some(expected));
    }

    #[test]
    fn test_monthly_without_anchor_uses_current_day() {
        let rule = RecurrenceRule::monthly(1);
        assert_eq!(next_occurrence(date(2024, 1, 31), &rule), Some(date(2024, 2, 29)));
        assert_eq!(next_occurrence(date(2024, 5, 15), &rule), Some(date(2024, 6, 15)));
    }

    #[test]
    fn test_monthly_crosses_year() {
        let rule = RecurrenceRule::monthly(3).on_day(5);
        assert_eq!(next_occurrence(date(2024, 11, 5), &rule), Some(date(2025, 2, 5)));
        let rule = RecurrenceRule::monthly(25);
        assert_eq!(next_occurrence(date(2024, 12, 1), &rule), Some(date(2027, 1, 1)));
    }

    #[test]
    fn test_yearly_leap_day_clamps() {
        let rule = RecurrenceRule::yearly(1);
        assert_eq!(next_occurrence(date(2024, 2, 29), &rule), Some(date(2025, 2, 28)));
        let rule = RecurrenceRule::yearly(4);
        assert_eq!(next_occurrence(date(2024, 2, 29), &rule), Some(date(2028, 2, 29)));
    }

    #[test]
    fn test_yearly_with_month_and_day() {
        let rule = RecurrenceRule::yearly(1).in_month(3).on_day(15);
        assert_eq!(next_occurrence(date(2024, 3, 15), &rule), Some(date(2025, 3, 15)));

        let rule = RecurrenceRule::yearly(1).in_month(2);
        assert_eq!(next_occurrence(date(2024, 1, 31), &rule), Some(date(2025, 2, 28)));
    }

    #[test]
    fn test_out_of_range_returns_none() {
        assert_eq!(next_occurrence(NaiveDate::MAX, &RecurrenceRule::daily(1)), None);
        assert_eq!(next_occurrence(NaiveDate::MAX, &RecurrenceRule::yearly(1)), None);
        assert_eq!(next_occurrence(NaiveDate::MAX, &RecurrenceRule::monthly(1)), None);
    }

    #[test]
    fn test_first_occurrence() {
        let monday = date(2024, 1, 1);
        let wednesday = first_occurrence(monday, &RecurrenceRule::weekly(1).on_weekday(3));
        assert_eq!(wednesday, Some(date(2024, 1, 3)));

        let sunday = first_occurrence(monday, &RecurrenceRule::weekly(1).on_weekday(0));
        assert_eq!(sunday, Some(date(2024, 1, 7)));

        assert_eq!(first_occurrence(monday, &RecurrenceRule::monthly(1).on_day(15)), Some(monday));
        assert_eq!(first_occurrence(monday, &RecurrenceRule::weekly(1)), Some(monday));
    }

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (1900i32..2200, 1u32..=12, 1u32..=31)
            .prop_map(|(y, m, d)| clamped_date(y, m, d).unwrap())
    }

    proptest! {
        #[test]
        fn prop_daily_adds_exactly_interval(current in any_date(), interval in 1u32..=999) {
            let next = next_occurrence(current, &RecurrenceRule::daily(interval)).unwrap();
            prop_assert_eq!((next - current).num_days(), interval as i64);
        }

        #[test]
        fn prop_weekly_anchor_lands_on_weekday(
            current in any_date(),
            interval in 1u32..=999,
            weekday in 0u8..=6,
        ) {
            let next = next_occurrence(current, &RecurrenceRule::weekly(interval).on_weekday(weekday)).unwrap();
            let gap = (next - current).num_days();
            prop_assert_eq!(next.weekday().num_days_from_sunday(), weekday as u32);
            prop_assert!(gap >= interval as i64 * 7 && gap < interval as i64 * 7 + 7);
        }

        #[test]
        fn prop_monthly_never_overflows_month(
            current in any_date(),
            interval in 1u32..=999,
            day in 1u8..=31,
        ) {
            let next = next_occurrence(current, &RecurrenceRule::monthly(interval).on_day(day)).unwrap();
            prop_assert!(next > current);
            prop_assert_eq!(next.day(), (day as u32).min(days_in_month(next.year(), next.month())));
        }

        #[test]
        fn prop_every_rule_advances(
            current in any_date(),
            interval in 1u32..=999,
            kind in 0usize..4,
            day in 1u8..=31,
            month in 1u8..=12,
        ) {
            let rule = match kind {
                0 => RecurrenceRule::daily(interval),
                1 => RecurrenceRule::weekly(interval).on_weekday(day % 7),
                2 => RecurrenceRule::monthly(interval).on_day(day),
                _ => RecurrenceRule::yearly(interval).in_month(month).on_day(day),
            };
            let next = next_occurrence(current, &rule).unwrap();
            prop_assert!(next > current);
        }
    }
}
