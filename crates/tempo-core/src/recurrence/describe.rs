use chrono::NaiveDate;

use crate::models::{RecurrenceRule, RecurrenceType};

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// English ordinal for a day number: 1st, 2nd, 3rd, 4th, 11th, 22nd.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn weekday_name(day_of_week: u8) -> Option<&'static str> {
    WEEKDAYS.get(day_of_week as usize).copied()
}

fn month_name(month_of_year: u8) -> Option<&'static str> {
    (month_of_year as usize)
        .checked_sub(1)
        .and_then(|index| MONTHS.get(index))
        .copied()
}

/// Human summary of a rule, e.g. "Every 2 weeks on Monday".
pub fn describe(rule: &RecurrenceRule) -> String {
    let unit = match rule.recurrence_type {
        RecurrenceType::Daily => "day",
        RecurrenceType::Weekly => "week",
        RecurrenceType::Monthly => "month",
        RecurrenceType::Yearly => "year",
    };

    let mut summary = if rule.interval == 1 {
        format!("Every {}", unit)
    } else {
        format!("Every {} {}s", rule.interval, unit)
    };

    match rule.recurrence_type {
        RecurrenceType::Daily => {}
        RecurrenceType::Weekly => {
            if let Some(name) = rule.day_of_week.and_then(weekday_name) {
                summary.push_str(" on ");
                summary.push_str(name);
            }
        }
        RecurrenceType::Monthly => {
            if let Some(day) = rule.day_of_month {
                summary.push_str(&format!(" on the {}", ordinal(day as u32)));
            }
        }
        RecurrenceType::Yearly => {
            match (rule.month_of_year.and_then(month_name), rule.day_of_month) {
                (Some(month), Some(day)) => {
                    summary.push_str(&format!(" on {} {}", month, ordinal(day as u32)))
                }
                (Some(month), None) => summary.push_str(&format!(" in {}", month)),
                (None, Some(day)) => {
                    summary.push_str(&format!(" on the {}", ordinal(day as u32)))
                }
                (None, None) => {}
            }
        }
    }

    summary
}

/// [`describe`] followed by the last date the rule runs on, if any.
pub fn describe_with_end(rule: &RecurrenceRule, end_date: Option<NaiveDate>) -> String {
    match end_date {
        Some(end) => format!("{}, until {}", describe(rule), end.format("%Y-%m-%d")),
        None => describe(rule),
    }
}
