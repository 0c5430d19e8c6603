use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    None,
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::None
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(TaskPriority::None),
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

/// The calendar unit a recurrence advances by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecurrenceType::Daily => write!(f, "daily"),
            RecurrenceType::Weekly => write!(f, "weekly"),
            RecurrenceType::Monthly => write!(f, "monthly"),
            RecurrenceType::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence type: {0}")]
pub struct ParseRecurrenceTypeError(String);

impl FromStr for RecurrenceType {
    type Err = ParseRecurrenceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(RecurrenceType::Daily),
            "weekly" | "week" => Ok(RecurrenceType::Weekly),
            "monthly" | "month" => Ok(RecurrenceType::Monthly),
            "yearly" | "year" | "annually" => Ok(RecurrenceType::Yearly),
            _ => Err(ParseRecurrenceTypeError(s.to_string())),
        }
    }
}

/// How often, and on which calendar anchors, a template repeats.
///
/// Weekday numbering starts at 0 for Sunday. Anchors are only meaningful for
/// the pattern types that use them; see
/// [`validate_rule`](crate::recurrence::validate_rule).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecurrenceRule {
    pub recurrence_type: RecurrenceType,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_of_year: Option<u8>,
}

impl RecurrenceRule {
    pub fn new(recurrence_type: RecurrenceType, interval: u32) -> Self {
        Self {
            recurrence_type,
            interval,
            day_of_week: None,
            day_of_month: None,
            month_of_year: None,
        }
    }

    pub fn daily(interval: u32) -> Self {
        Self::new(RecurrenceType::Daily, interval)
    }

    pub fn weekly(interval: u32) -> Self {
        Self::new(RecurrenceType::Weekly, interval)
    }

    pub fn monthly(interval: u32) -> Self {
        Self::new(RecurrenceType::Monthly, interval)
    }

    pub fn yearly(interval: u32) -> Self {
        Self::new(RecurrenceType::Yearly, interval)
    }

    pub fn on_weekday(mut self, day_of_week: u8) -> Self {
        self.day_of_week = Some(day_of_week);
        self
    }

    pub fn on_day(mut self, day_of_month: u8) -> Self {
        self.day_of_month = Some(day_of_month);
        self
    }

    pub fn in_month(mut self, month_of_year: u8) -> Self {
        self.month_of_year = Some(month_of_year);
        self
    }
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::recurrence::describe(self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
        }
    }
}

/// The task fields a template carries and hands to every instance it creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub tag: Option<String>,
    pub subtasks: Vec<Subtask>,
}

/// A recurring task definition from which dated instances are materialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringTemplate {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub tag: Option<String>,
    pub subtasks: Vec<Subtask>,
    pub rule: RecurrenceRule,
    /// First date the template may produce an instance on
    pub start_date: NaiveDate,
    /// Last date (inclusive) the template may produce an instance on
    pub end_date: Option<NaiveDate>,
    /// Paused templates keep their history but generate nothing new
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringTemplate {
    pub fn new(
        owner_id: Uuid,
        fields: TaskFields,
        rule: RecurrenceRule,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id,
            title: fields.title,
            description: fields.description,
            priority: fields.priority,
            tag: fields.tag,
            subtasks: fields.subtasks,
            rule,
            start_date,
            end_date,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A concrete dated task row.
///
/// Instances snapshot the template's task fields when they are created and
/// are independent of the template afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskInstance {
    pub id: Uuid,
    /// `None` for standalone tasks that were never generated from a template
    pub template_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    /// Ordering slot within the owner's list for `date`, contiguous from 0
    pub position: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub tag: Option<String>,
    pub subtasks: Vec<Subtask>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Changes to an existing template. Nested options distinguish "leave alone"
/// (`None`) from "clear" (`Some(None)`).
///
/// Rule edits only affect future generation; instances already created keep
/// the values they were created with.
#[derive(Debug, Clone, Default)]
pub struct UpdateTemplateData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub tag: Option<Option<String>>,
    pub subtasks: Option<Vec<Subtask>>,
    /// The pattern type is fixed once a template exists; any value other than
    /// the current one is rejected
    pub recurrence_type: Option<RecurrenceType>,
    pub interval: Option<u32>,
    pub day_of_week: Option<Option<u8>>,
    pub day_of_month: Option<Option<u8>>,
    pub month_of_year: Option<Option<u8>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub active: Option<bool>,
}

impl UpdateTemplateData {
    /// Returns true if any recurrence setting is being changed.
    pub fn touches_rule(&self) -> bool {
        self.recurrence_type.is_some()
            || self.interval.is_some()
            || self.day_of_week.is_some()
            || self.day_of_month.is_some()
            || self.month_of_year.is_some()
    }

    /// Applies the changes to a copy of `template`.
    pub fn apply_to(&self, template: &RecurringTemplate) -> RecurringTemplate {
        let mut updated = template.clone();

        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(priority) = self.priority {
            updated.priority = priority;
        }
        if let Some(tag) = &self.tag {
            updated.tag = tag.clone();
        }
        if let Some(subtasks) = &self.subtasks {
            updated.subtasks = subtasks.clone();
        }
        if let Some(interval) = self.interval {
            updated.rule.interval = interval;
        }
        if let Some(day_of_week) = self.day_of_week {
            updated.rule.day_of_week = day_of_week;
        }
        if let Some(day_of_month) = self.day_of_month {
            updated.rule.day_of_month = day_of_month;
        }
        if let Some(month_of_year) = self.month_of_year {
            updated.rule.month_of_year = month_of_year;
        }
        if let Some(end_date) = self.end_date {
            updated.end_date = end_date;
        }
        if let Some(active) = self.active {
            updated.active = active;
        }

        updated.updated_at = Utc::now();
        updated
    }
}

/// Configuration for materialization behavior
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MaterializationConfig {
    /// Default materialization window in days
    pub lookahead_days: u32,
    /// Include near-past in materialization windows (days)
    pub materialization_grace_days: u32,
    /// Limit for inserts per template in one call; 0 means unlimited
    pub max_batch_size: u32,
}

impl Default for MaterializationConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 30,
            materialization_grace_days: 3,
            max_batch_size: 0,
        }
    }
}

impl MaterializationConfig {
    /// Default `[today - grace, today + lookahead]` window, saturating at the
    /// ends of the representable calendar.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(chrono::Days::new(self.materialization_grace_days as u64))
            .unwrap_or(NaiveDate::MIN);
        let end = today
            .checked_add_days(chrono::Days::new(self.lookahead_days as u64))
            .unwrap_or(NaiveDate::MAX);
        (start, end)
    }
}
