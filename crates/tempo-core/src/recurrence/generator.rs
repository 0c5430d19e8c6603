//! Enumeration of a template's occurrence dates inside a date window.

use chrono::{Datelike, NaiveDate};
use tracing::error;
use uuid::Uuid;

use super::calculator::{first_occurrence, next_occurrence};
use crate::error::CoreError;
use crate::models::{RecurrenceRule, RecurrenceType, RecurringTemplate};

/// Hard cap on cursor steps for one enumeration.
pub const MAX_ITERATIONS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    At(NaiveDate),
    /// The rule failed to move past this date; the next poll reports it.
    Stalled(NaiveDate),
    Exhausted,
}

/// Occurrence dates of one template that fall inside a window.
///
/// Yields dates in strictly increasing order. If the rule stops advancing the
/// cursor, the dates already yielded stand and one final
/// [`CoreError::SafetyLoopAbort`] is yielded before the iterator ends.
/// A clone continues from the same cursor; call [`generate_instances`] again
/// to start over.
#[derive(Debug, Clone)]
pub struct Occurrences {
    template_id: Uuid,
    rule: RecurrenceRule,
    window_start: NaiveDate,
    window_end: NaiveDate,
    end_date: Option<NaiveDate>,
    cursor: Cursor,
    steps: usize,
}

impl Occurrences {
    fn new(
        template: &RecurringTemplate,
        window_start: NaiveDate,
        window_end: NaiveDate,
        respect_active: bool,
    ) -> Self {
        let rule = anchored_rule(&template.rule, template.start_date);
        let ended_before_start = template
            .end_date
            .is_some_and(|end| end < template.start_date);

        let cursor = if (respect_active && !template.active) || ended_before_start {
            Cursor::Exhausted
        } else {
            first_occurrence(template.start_date, &rule).map_or(Cursor::Exhausted, Cursor::At)
        };

        Self {
            template_id: template.id,
            rule,
            window_start,
            window_end,
            end_date: template.end_date,
            cursor,
            steps: 0,
        }
    }
}

impl Iterator for Occurrences {
    type Item = Result<NaiveDate, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = match self.cursor {
                Cursor::Exhausted => return None,
                Cursor::Stalled(at) => {
                    self.cursor = Cursor::Exhausted;
                    error!(
                        template_id = %self.template_id,
                        cursor = %at,
                        steps = self.steps,
                        "recurrence stopped advancing, halting generation"
                    );
                    return Some(Err(CoreError::SafetyLoopAbort {
                        template_id: self.template_id,
                        cursor: at,
                    }));
                }
                Cursor::At(date) => date,
            };

            if cursor > self.window_end || self.end_date.is_some_and(|end| cursor > end) {
                self.cursor = Cursor::Exhausted;
                return None;
            }

            self.steps += 1;
            if self.steps > MAX_ITERATIONS {
                self.cursor = Cursor::Stalled(cursor);
                continue;
            }

            self.cursor = match next_occurrence(cursor, &self.rule) {
                Some(next) if next > cursor => Cursor::At(next),
                Some(_) => Cursor::Stalled(cursor),
                None => Cursor::Exhausted,
            };

            if cursor >= self.window_start {
                return Some(Ok(cursor));
            }
        }
    }
}

impl std::iter::FusedIterator for Occurrences {}

/// Pins the day (and for yearly rules, the month) of an unanchored monthly or
/// yearly rule to the template's start date, so a series that starts on the
/// 31st returns to the 31st after passing through a shorter month.
fn anchored_rule(rule: &RecurrenceRule, start_date: NaiveDate) -> RecurrenceRule {
    let mut anchored = *rule;
    match rule.recurrence_type {
        RecurrenceType::Monthly => {
            anchored.day_of_month = rule.day_of_month.or(Some(start_date.day() as u8));
        }
        RecurrenceType::Yearly => {
            anchored.month_of_year = rule.month_of_year.or(Some(start_date.month() as u8));
            anchored.day_of_month = rule.day_of_month.or(Some(start_date.day() as u8));
        }
        RecurrenceType::Daily | RecurrenceType::Weekly => {}
    }
    anchored
}

/// Enumerates the occurrence dates of `template` inside
/// `[window_start, window_end]`, bounded by the template's start and end dates.
///
/// Stateless: identical arguments always produce the identical sequence.
/// Inactive templates and templates whose end date precedes their start date
/// produce nothing.
pub fn generate_instances(
    template: &RecurringTemplate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Occurrences {
    Occurrences::new(template, window_start, window_end, true)
}

/// Collects [`generate_instances`] into a vector, failing on a safety abort.
pub fn collect_instance_dates(
    template: &RecurringTemplate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Vec<NaiveDate>, CoreError> {
    generate_instances(template, window_start, window_end).collect()
}

/// The next `count` occurrence dates on or after `from`.
///
/// Unlike [`generate_instances`] this ignores the active flag, so a paused
/// template can still be previewed.
pub fn preview_occurrences(
    template: &RecurringTemplate,
    from: NaiveDate,
    count: usize,
) -> Result<Vec<NaiveDate>, CoreError> {
    let window_end = template.end_date.unwrap_or(NaiveDate::MAX);
    Occurrences::new(template, from, window_end, false)
        .take(count)
        .collect()
}
