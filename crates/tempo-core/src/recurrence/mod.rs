//! Recurrence rules: occurrence calculation, window enumeration, validation
//! and human-readable descriptions.
//!
//! Everything here is synchronous and pure. Storage only enters the picture in
//! [`crate::materialization`].

pub mod calculator;
pub mod describe;
pub mod generator;
pub mod validation;

pub use calculator::{days_in_month, first_occurrence, is_leap_year, next_occurrence};
pub use describe::{describe, describe_with_end};
pub use generator::{
    collect_instance_dates, generate_instances, preview_occurrences, Occurrences, MAX_ITERATIONS,
};
pub use validation::{
    validate_end_date, validate_recurrence_settings, validate_rule, RuleValidationError,
};
