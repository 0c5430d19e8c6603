use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{RecurringTemplate, TaskInstance};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

// Domain modules implementing the traits below for SqliteRepository
pub mod instances;
mod rows;
pub mod templates;

/// Persistence of recurring templates, keyed by owner.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn insert_template(&self, template: &RecurringTemplate) -> Result<RecurringTemplate, CoreError>;
    async fn find_template_by_id(&self, id: Uuid) -> Result<Option<RecurringTemplate>, CoreError>;
    async fn find_templates_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringTemplate>, CoreError>;
    async fn find_active_templates_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringTemplate>, CoreError>;
    async fn update_template(&self, template: &RecurringTemplate) -> Result<RecurringTemplate, CoreError>;
    async fn delete_template(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Persistence of dated task instances.
///
/// Implementations must enforce uniqueness of `(template_id, date)` for
/// generated instances and report a violation as
/// [`CoreError::DuplicateInstance`]; materialization treats that as success.
/// Deleting instances must keep each remaining date's positions contiguous.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn find_instance(&self, template_id: Uuid, date: NaiveDate) -> Result<Option<TaskInstance>, CoreError>;
    async fn insert_instance(&self, instance: &TaskInstance) -> Result<TaskInstance, CoreError>;
    async fn count_instances_on_date(&self, owner_id: Uuid, date: NaiveDate) -> Result<i64, CoreError>;
    async fn find_instances_on_date(&self, owner_id: Uuid, date: NaiveDate) -> Result<Vec<TaskInstance>, CoreError>;
    async fn find_instances_for_template(&self, template_id: Uuid) -> Result<Vec<TaskInstance>, CoreError>;
    async fn delete_instances_for_template(&self, template_id: Uuid) -> Result<u64, CoreError>;
    async fn set_instance_completed(&self, id: Uuid, completed: bool) -> Result<TaskInstance, CoreError>;
}

/// Main repository trait that composes the domain stores
pub trait Repository: TemplateStore + InstanceStore {}

impl<T: TemplateStore + InstanceStore + ?Sized> Repository for T {}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}
