use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{RecurrenceRule, RecurrenceType};

pub const MIN_INTERVAL: u32 = 1;
pub const MAX_INTERVAL: u32 = 999;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    #[error("interval must be between 1 and 999, got {0}")]
    IntervalOutOfRange(u32),

    #[error("day of week must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    DayOfWeekOutOfRange(u8),

    #[error("day of month must be between 1 and 31, got {0}")]
    DayOfMonthOutOfRange(u8),

    #[error("month of year must be between 1 and 12, got {0}")]
    MonthOfYearOutOfRange(u8),

    #[error("{anchor} does not apply to {recurrence_type} recurrence")]
    AnchorNotApplicable {
        anchor: &'static str,
        recurrence_type: RecurrenceType,
    },

    #[error("end date {end_date} must be after {today}")]
    EndDateNotInFuture { end_date: NaiveDate, today: NaiveDate },
}

/// Checks the interval and anchors of `rule`.
pub fn validate_rule(rule: &RecurrenceRule) -> Result<(), RuleValidationError> {
    if !(MIN_INTERVAL..=MAX_INTERVAL).contains(&rule.interval) {
        return Err(RuleValidationError::IntervalOutOfRange(rule.interval));
    }

    let kind = rule.recurrence_type;
    let not_applicable = |anchor| RuleValidationError::AnchorNotApplicable {
        anchor,
        recurrence_type: kind,
    };

    if let Some(day) = rule.day_of_week {
        if kind != RecurrenceType::Weekly {
            return Err(not_applicable("day of week"));
        }
        if day > 6 {
            return Err(RuleValidationError::DayOfWeekOutOfRange(day));
        }
    }

    if let Some(day) = rule.day_of_month {
        if !matches!(kind, RecurrenceType::Monthly | RecurrenceType::Yearly) {
            return Err(not_applicable("day of month"));
        }
        if !(1..=31).contains(&day) {
            return Err(RuleValidationError::DayOfMonthOutOfRange(day));
        }
    }

    if let Some(month) = rule.month_of_year {
        if kind != RecurrenceType::Yearly {
            return Err(not_applicable("month of year"));
        }
        if !(1..=12).contains(&month) {
            return Err(RuleValidationError::MonthOfYearOutOfRange(month));
        }
    }

    Ok(())
}

/// An end date must lie strictly after the day it is validated on.
pub fn validate_end_date(end_date: NaiveDate, today: NaiveDate) -> Result<(), RuleValidationError> {
    if end_date <= today {
        return Err(RuleValidationError::EndDateNotInFuture { end_date, today });
    }
    Ok(())
}

/// Validates a rule together with the optional end date of its template.
///
/// Runs before any generation or I/O.
pub fn validate_recurrence_settings(
    rule: &RecurrenceRule,
    end_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), RuleValidationError> {
    validate_rule(rule)?;
    if let Some(end_date) = end_date {
        validate_end_date(end_date, today)?;
    }
    Ok(())
}
