use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::materialization::{next_position, MaterializationService, MaterializationSummary};
use crate::models::{
    MaterializationConfig, RecurrenceRule, RecurringTemplate, TaskFields, TaskInstance,
    UpdateTemplateData,
};
use crate::recurrence::{preview_occurrences, validate_end_date, validate_recurrence_settings, validate_rule};
use crate::repository::Repository;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn require_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
    }
    Ok(())
}

/// Entry point for applications: manages recurring templates and keeps their
/// dated instances materialized.
pub struct RecurringTaskService<R: Repository + ?Sized> {
    repo: Arc<R>,
    materializer: MaterializationService<R>,
}

impl<R: Repository + ?Sized> RecurringTaskService<R> {
    pub fn new(repo: Arc<R>, config: MaterializationConfig) -> Self {
        let materializer = MaterializationService::new(repo.clone(), config);
        Self { repo, materializer }
    }

    pub fn with_defaults(repo: Arc<R>) -> Self {
        Self::new(repo, MaterializationConfig::default())
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub fn config(&self) -> &MaterializationConfig {
        self.materializer.config()
    }

    async fn require_template(&self, id: Uuid) -> Result<RecurringTemplate, CoreError> {
        self.repo
            .find_template_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Template with id {} not found", id)))
    }

    /// Validates and stores a new active template. No instances are created
    /// until a range is materialized.
    pub async fn create_recurring_template(
        &self,
        owner_id: Uuid,
        fields: TaskFields,
        rule: RecurrenceRule,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<RecurringTemplate, CoreError> {
        require_title(&fields.title)?;
        validate_recurrence_settings(&rule, end_date, today())?;

        let template = RecurringTemplate::new(owner_id, fields, rule, start_date, end_date);
        let template = self.repo.insert_template(&template).await?;

        info!(template_id = %template.id, %owner_id, rule = %template.rule, "created recurring template");
        Ok(template)
    }

    /// Materializes every active template of `owner_id` over the window.
    ///
    /// A failing template is recorded in the summary and the rest still run.
    /// Templates cut short by `max_batch_size` are counted in
    /// `templates_truncated`; either case makes the summary unclean.
    pub async fn generate_tasks_for_date_range(
        &self,
        owner_id: Uuid,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<MaterializationSummary, CoreError> {
        if window_start > window_end {
            return Err(CoreError::InvalidInput(format!(
                "window start {} is after window end {}",
                window_start, window_end
            )));
        }

        let started = Instant::now();
        let templates = self.repo.find_active_templates_by_owner(owner_id).await?;
        let mut summary = MaterializationSummary::default();
        let cancel = CancellationToken::new();

        for template in &templates {
            match self.materializer.run(template, window_start, window_end, &cancel).await {
                Ok(run) => summary.record_run(run),
                Err(e) => {
                    warn!(template_id = %template.id, error = %e, "materialization failed for template");
                    summary.record_failure(template.id, &e);
                }
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            %owner_id,
            %window_start,
            %window_end,
            templates = summary.templates_processed,
            created = summary.instances_created,
            failed = summary.templates_with_errors,
            truncated = summary.templates_truncated,
            "generated tasks for date range"
        );
        Ok(summary)
    }

    /// Materializes the configured window around today for `owner_id`.
    pub async fn ensure_upcoming(&self, owner_id: Uuid) -> Result<MaterializationSummary, CoreError> {
        let (window_start, window_end) = self.config().window(today());
        self.generate_tasks_for_date_range(owner_id, window_start, window_end).await
    }

    /// Materializes a single template over the window.
    pub async fn materialize_template(
        &self,
        id: Uuid,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<usize, CoreError> {
        let template = self.require_template(id).await?;
        self.materializer.materialize(&template, window_start, window_end).await
    }

    /// Applies `changes` to a template. Existing instances are left as they
    /// are; only later materialization sees the new values.
    pub async fn update_recurring_template(
        &self,
        id: Uuid,
        changes: UpdateTemplateData,
    ) -> Result<RecurringTemplate, CoreError> {
        let current = self.require_template(id).await?;

        if let Some(kind) = changes.recurrence_type {
            if kind != current.rule.recurrence_type {
                return Err(CoreError::InvalidInput(format!(
                    "cannot change a {} template to {}; create a new template instead",
                    current.rule.recurrence_type, kind
                )));
            }
        }
        if let Some(title) = &changes.title {
            require_title(title)?;
        }

        let updated = changes.apply_to(&current);
        if changes.touches_rule() {
            validate_rule(&updated.rule)?;
        }
        if let Some(Some(end_date)) = changes.end_date {
            validate_end_date(end_date, today())?;
        }

        let updated = self.repo.update_template(&updated).await?;
        info!(template_id = %id, rule = %updated.rule, "updated recurring template");
        Ok(updated)
    }

    /// Pauses or resumes generation for a template.
    pub async fn set_template_active(&self, id: Uuid, active: bool) -> Result<RecurringTemplate, CoreError> {
        let changes = UpdateTemplateData {
            active: Some(active),
            ..Default::default()
        };
        let updated = changes.apply_to(&self.require_template(id).await?);
        let updated = self.repo.update_template(&updated).await?;
        info!(template_id = %id, active, "changed template state");
        Ok(updated)
    }

    /// Deletes a template together with all of its instances.
    pub async fn delete_recurring_template(&self, id: Uuid) -> Result<(), CoreError> {
        self.require_template(id).await?;
        let removed = self.repo.delete_instances_for_template(id).await?;
        self.repo.delete_template(id).await?;
        info!(template_id = %id, instances_removed = removed, "deleted recurring template");
        Ok(())
    }

    /// Adds a one-off task at the end of the owner's list for `date`.
    pub async fn add_standalone_task(
        &self,
        owner_id: Uuid,
        fields: TaskFields,
        date: NaiveDate,
    ) -> Result<TaskInstance, CoreError> {
        require_title(&fields.title)?;

        let existing = self.repo.count_instances_on_date(owner_id, date).await?;
        let instance = TaskInstance {
            id: Uuid::now_v7(),
            template_id: None,
            owner_id,
            date,
            position: next_position(existing),
            title: fields.title,
            description: fields.description,
            priority: fields.priority,
            tag: fields.tag,
            subtasks: fields.subtasks,
            completed: false,
            created_at: Utc::now(),
        };
        self.repo.insert_instance(&instance).await
    }

    /// The owner's tasks on `date`, in position order.
    pub async fn tasks_on_date(&self, owner_id: Uuid, date: NaiveDate) -> Result<Vec<TaskInstance>, CoreError> {
        self.repo.find_instances_on_date(owner_id, date).await
    }

    pub async fn set_task_completed(&self, id: Uuid, completed: bool) -> Result<TaskInstance, CoreError> {
        self.repo.set_instance_completed(id, completed).await
    }

    pub async fn templates_for_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringTemplate>, CoreError> {
        self.repo.find_templates_by_owner(owner_id).await
    }

    /// The next `count` occurrence dates of a template on or after `from`,
    /// without touching stored instances.
    pub async fn preview_template(&self, id: Uuid, from: NaiveDate, count: usize) -> Result<Vec<NaiveDate>, CoreError> {
        let template = self.require_template(id).await?;
        preview_occurrences(&template, from, count)
    }
}
