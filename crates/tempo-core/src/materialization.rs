use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{MaterializationConfig, RecurringTemplate, Subtask, TaskInstance};
use crate::recurrence::generate_instances;
use crate::repository::InstanceStore;

/// Statistics collected during materialization operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializationSummary {
    /// Number of templates processed
    pub templates_processed: usize,
    /// Total instances created across all templates
    pub instances_created: usize,
    /// Number of templates that had errors
    pub templates_with_errors: usize,
    /// Number of templates stopped by the batch limit with dates still missing
    pub templates_truncated: usize,
    /// Detailed error messages
    pub errors: Vec<String>,
    /// Time taken for the operation
    pub duration_ms: u64,
}

impl MaterializationSummary {
    pub fn record_success(&mut self, created: usize) {
        self.templates_processed += 1;
        self.instances_created += created;
    }

    pub fn record_run(&mut self, run: MaterializationRun) {
        self.record_success(run.created);
        if run.truncated {
            self.templates_truncated += 1;
        }
    }

    pub fn record_failure(&mut self, template_id: Uuid, error: &CoreError) {
        self.templates_processed += 1;
        self.templates_with_errors += 1;
        self.errors.push(format!("template {}: {}", template_id, error));
    }

    /// True when every template ran to the end of the window without error.
    pub fn is_clean(&self) -> bool {
        self.templates_with_errors == 0 && self.templates_truncated == 0
    }
}

/// Outcome of materializing one template over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializationRun {
    pub created: usize,
    /// The run stopped early, by the batch limit or cancellation, while
    /// occurrences in the window still had no instance
    pub truncated: bool,
}

/// Position for the next task on a date that already holds `existing_count` tasks.
pub fn next_position(existing_count: i64) -> i64 {
    existing_count.max(0)
}

/// Builds the instance `template` produces on `date`.
///
/// Every carried field is listed here; instances never read back from their
/// template after creation.
pub fn instance_from_template(template: &RecurringTemplate, date: NaiveDate, position: i64) -> TaskInstance {
    TaskInstance {
        id: Uuid::now_v7(),
        template_id: Some(template.id),
        owner_id: template.owner_id,
        date,
        position,
        title: template.title.clone(),
        description: template.description.clone(),
        priority: template.priority,
        tag: template.tag.clone(),
        subtasks: template
            .subtasks
            .iter()
            .map(|subtask| Subtask {
                title: subtask.title.clone(),
                completed: false,
            })
            .collect(),
        completed: false,
        created_at: Utc::now(),
    }
}

/// Turns template occurrences into stored task instances.
///
/// Safe to run repeatedly over overlapping windows: a date that already has
/// an instance of the template is skipped, so repeated calls converge on
/// exactly one instance per occurrence.
pub struct MaterializationService<S: InstanceStore + ?Sized> {
    store: Arc<S>,
    config: MaterializationConfig,
}

impl<S: InstanceStore + ?Sized> MaterializationService<S> {
    pub fn new(store: Arc<S>, config: MaterializationConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, MaterializationConfig::default())
    }

    pub fn config(&self) -> &MaterializationConfig {
        &self.config
    }

    /// Creates the missing instances of `template` inside
    /// `[window_start, window_end]` and returns how many were created.
    ///
    /// Each insert commits on its own. If the store fails midway the error is
    /// returned and the instances created before it stay.
    pub async fn materialize(
        &self,
        template: &RecurringTemplate,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<usize, CoreError> {
        self.materialize_with_cancel(template, window_start, window_end, &CancellationToken::new())
            .await
    }

    /// [`materialize`](Self::materialize), stopping before the next insert
    /// once `cancel` fires. Returns the number created up to that point.
    pub async fn materialize_with_cancel(
        &self,
        template: &RecurringTemplate,
        window_start: NaiveDate,
        window_end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<usize, CoreError> {
        self.run(template, window_start, window_end, cancel)
            .await
            .map(|run| run.created)
    }

    /// Materializes the window and also reports whether the run stopped
    /// before every occurrence had an instance.
    ///
    /// With `max_batch_size` set, at most that many instances are created per
    /// call; later calls pick up the remaining dates.
    pub async fn run(
        &self,
        template: &RecurringTemplate,
        window_start: NaiveDate,
        window_end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<MaterializationRun, CoreError> {
        if window_start > window_end {
            return Err(CoreError::InvalidInput(format!(
                "window start {} is after window end {}",
                window_start, window_end
            )));
        }

        if !template.active {
            debug!(template_id = %template.id, "template inactive, nothing to materialize");
            return Ok(MaterializationRun::default());
        }

        let started = Instant::now();
        let batch_limit = self.config.max_batch_size as usize;
        let mut created = 0usize;
        let mut skipped = 0usize;
        let mut truncated = false;

        for occurrence in generate_instances(template, window_start, window_end) {
            let date = occurrence?;

            if cancel.is_cancelled() {
                info!(template_id = %template.id, created, "materialization cancelled");
                return Ok(MaterializationRun { created, truncated: true });
            }

            if self.store.find_instance(template.id, date).await?.is_some() {
                skipped += 1;
                continue;
            }

            // A limit of zero means unlimited.
            if batch_limit > 0 && created >= batch_limit {
                warn!(
                    template_id = %template.id,
                    created,
                    limit = batch_limit,
                    next_missing = %date,
                    "batch limit reached, remaining dates left for the next run"
                );
                truncated = true;
                break;
            }

            let existing = self.store.count_instances_on_date(template.owner_id, date).await?;
            let instance = instance_from_template(template, date, next_position(existing));

            match self.store.insert_instance(&instance).await {
                Ok(_) => {
                    debug!(template_id = %template.id, %date, position = instance.position, "instance created");
                    created += 1;
                }
                Err(CoreError::DuplicateInstance { .. }) => {
                    warn!(template_id = %template.id, %date, "instance created concurrently, skipping");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            template_id = %template.id,
            %window_start,
            %window_end,
            created,
            skipped,
            truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "materialized template"
        );
        Ok(MaterializationRun { created, truncated })
    }
}
