//! # Tempo Core Library
//!
//! A recurring-task scheduling engine: recurring templates are expanded into
//! concrete, dated task instances over a requested window, idempotently, so
//! the same window can be materialized any number of times.
//!
//! ## Features
//!
//! - **Calendar-Correct Recurrence**: daily, weekly, monthly and yearly rules
//!   with intervals and optional weekday, day-of-month and month anchors;
//!   month ends and leap days are clamped instead of skipped
//! - **Idempotent Materialization**: at most one instance per template and
//!   date, even under concurrent runs
//! - **Per-Day Ordering**: every task on a date gets a contiguous position
//! - **Pluggable Storage**: async store traits with a SQLite implementation
//!
//! ## Core Modules
//!
//! - [`recurrence`]: Occurrence calculation, window enumeration, validation
//! - [`materialization`]: Instance creation from templates
//! - [`service`]: Application-facing operations
//! - [`repository`]: Store traits and the SQLite implementation
//! - [`models`]: Core data structures and update objects
//! - [`db`]: Database connection and migration management
//! - [`config`]: Layered configuration
//! - [`logging`]: `tracing` subscriber setup
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use tempo_core::{
//!     config::Config, db, logging,
//!     models::{RecurrenceRule, TaskFields},
//!     repository::SqliteRepository,
//!     service::RecurringTaskService,
//! };
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new()?;
//!     logging::init_from_config(&config);
//!
//!     let pool = db::establish_connection_with(&config).await?;
//!     let service = RecurringTaskService::new(
//!         Arc::new(SqliteRepository::new(pool)),
//!         config.materialization.clone(),
//!     );
//!
//!     let owner = Uuid::now_v7();
//!     let fields = TaskFields { title: "Water plants".to_string(), ..Default::default() };
//!     let start = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
//!     service
//!         .create_recurring_template(owner, fields, RecurrenceRule::weekly(1).on_weekday(6), start, None)
//!         .await?;
//!
//!     let summary = service.ensure_upcoming(owner).await?;
//!     println!("Created {} tasks", summary.instances_created);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod materialization;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod service;

#[cfg(test)]
mod test_support;
