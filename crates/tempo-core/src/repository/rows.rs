//! Row shapes as stored in SQLite and their conversion to domain models.
//!
//! Small integers are kept as `i64` on the row side and range-checked on the
//! way out, so a hand-edited database surfaces as an error instead of a
//! silently wrapped value.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    RecurrenceRule, RecurrenceType, RecurringTemplate, Subtask, TaskInstance, TaskPriority,
};

#[derive(Debug, FromRow)]
pub(crate) struct TemplateRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub tag: Option<String>,
    pub subtasks: String,
    pub recurrence_type: RecurrenceType,
    pub recurrence_interval: i64,
    pub day_of_week: Option<i64>,
    pub day_of_month: Option<i64>,
    pub month_of_year: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct InstanceRow {
    pub id: Uuid,
    pub template_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub position: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub tag: Option<String>,
    pub subtasks: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

fn small<T: TryFrom<i64>>(column: &str, value: i64) -> Result<T, CoreError> {
    T::try_from(value)
        .map_err(|_| CoreError::InvalidInput(format!("stored {} out of range: {}", column, value)))
}

fn small_opt<T: TryFrom<i64>>(column: &str, value: Option<i64>) -> Result<Option<T>, CoreError> {
    value.map(|v| small(column, v)).transpose()
}

pub(crate) fn encode_subtasks(subtasks: &[Subtask]) -> Result<String, CoreError> {
    Ok(serde_json::to_string(subtasks)?)
}

fn decode_subtasks(raw: &str) -> Result<Vec<Subtask>, CoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

impl TryFrom<TemplateRow> for RecurringTemplate {
    type Error = CoreError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let rule = RecurrenceRule {
            recurrence_type: row.recurrence_type,
            interval: small("recurrence_interval", row.recurrence_interval)?,
            day_of_week: small_opt("day_of_week", row.day_of_week)?,
            day_of_month: small_opt("day_of_month", row.day_of_month)?,
            month_of_year: small_opt("month_of_year", row.month_of_year)?,
        };

        Ok(RecurringTemplate {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            priority: row.priority,
            tag: row.tag,
            subtasks: decode_subtasks(&row.subtasks)?,
            rule,
            start_date: row.start_date,
            end_date: row.end_date,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<InstanceRow> for TaskInstance {
    type Error = CoreError;

    fn try_from(row: InstanceRow) -> Result<Self, Self::Error> {
        Ok(TaskInstance {
            id: row.id,
            template_id: row.template_id,
            owner_id: row.owner_id,
            date: row.date,
            position: row.position,
            title: row.title,
            description: row.description,
            priority: row.priority,
            tag: row.tag,
            subtasks: decode_subtasks(&row.subtasks)?,
            completed: row.completed,
            created_at: row.created_at,
        })
    }
}

pub(crate) fn templates_from_rows(rows: Vec<TemplateRow>) -> Result<Vec<RecurringTemplate>, CoreError> {
    rows.into_iter().map(RecurringTemplate::try_from).collect()
}

pub(crate) fn instances_from_rows(rows: Vec<InstanceRow>) -> Result<Vec<TaskInstance>, CoreError> {
    rows.into_iter().map(TaskInstance::try_from).collect()
}
