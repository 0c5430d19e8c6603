use crate::error::CoreError;
use crate::models::TaskInstance;
use crate::repository::rows::{encode_subtasks, instances_from_rows, InstanceRow};
use crate::repository::{InstanceStore, SqliteRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

/// Maps a failed insert, recognising the `(template_id, date)` constraint.
fn map_insert_error(err: sqlx::Error, instance: &TaskInstance) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(template_id) = instance.template_id {
                return CoreError::DuplicateInstance {
                    template_id,
                    date: instance.date,
                };
            }
        }
    }
    CoreError::Database(err)
}

#[async_trait]
impl InstanceStore for SqliteRepository {
    async fn find_instance(&self, template_id: Uuid, date: NaiveDate) -> Result<Option<TaskInstance>, CoreError> {
        let row: Option<InstanceRow> = sqlx::query_as(
            "SELECT * FROM task_instances WHERE template_id = $1 AND date = $2"
        )
        .bind(template_id)
        .bind(date)
        .fetch_optional(self.pool())
        .await?;
        row.map(TaskInstance::try_from).transpose()
    }

    async fn insert_instance(&self, instance: &TaskInstance) -> Result<TaskInstance, CoreError> {
        let subtasks = encode_subtasks(&instance.subtasks)?;

        sqlx::query(
            r#"INSERT INTO task_instances (id, template_id, owner_id, date, position, title, description,
                priority, tag, subtasks, completed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#
        )
        .bind(instance.id)
        .bind(instance.template_id)
        .bind(instance.owner_id)
        .bind(instance.date)
        .bind(instance.position)
        .bind(&instance.title)
        .bind(&instance.description)
        .bind(instance.priority)
        .bind(&instance.tag)
        .bind(subtasks)
        .bind(instance.completed)
        .bind(instance.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_insert_error(e, instance))?;

        Ok(instance.clone())
    }

    async fn count_instances_on_date(&self, owner_id: Uuid, date: NaiveDate) -> Result<i64, CoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM task_instances WHERE owner_id = $1 AND date = $2"
        )
        .bind(owner_id)
        .bind(date)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    async fn find_instances_on_date(&self, owner_id: Uuid, date: NaiveDate) -> Result<Vec<TaskInstance>, CoreError> {
        let rows: Vec<InstanceRow> = sqlx::query_as(
            "SELECT * FROM task_instances WHERE owner_id = $1 AND date = $2 ORDER BY position"
        )
        .bind(owner_id)
        .bind(date)
        .fetch_all(self.pool())
        .await?;
        instances_from_rows(rows)
    }

    async fn find_instances_for_template(&self, template_id: Uuid) -> Result<Vec<TaskInstance>, CoreError> {
        let rows: Vec<InstanceRow> = sqlx::query_as(
            "SELECT * FROM task_instances WHERE template_id = $1 ORDER BY date"
        )
        .bind(template_id)
        .fetch_all(self.pool())
        .await?;
        instances_from_rows(rows)
    }

    async fn delete_instances_for_template(&self, template_id: Uuid) -> Result<u64, CoreError> {
        let mut tx = self.pool().begin().await?;

        let affected_days: Vec<(Uuid, NaiveDate)> = sqlx::query_as(
            "SELECT DISTINCT owner_id, date FROM task_instances WHERE template_id = $1"
        )
        .bind(template_id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM task_instances WHERE template_id = $1")
            .bind(template_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for (owner_id, date) in affected_days {
            Self::compact_positions_in_transaction(&mut tx, owner_id, date).await?;
        }

        tx.commit().await?;
        Ok(deleted)
    }

    async fn set_instance_completed(&self, id: Uuid, completed: bool) -> Result<TaskInstance, CoreError> {
        let result = sqlx::query("UPDATE task_instances SET completed = $1 WHERE id = $2")
            .bind(completed)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Task with id {} not found", id)));
        }

        let row: InstanceRow = sqlx::query_as("SELECT * FROM task_instances WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        TaskInstance::try_from(row)
    }
}

impl SqliteRepository {
    /// Renumbers the owner's tasks on `date` to 0..n, keeping their order.
    async fn compact_positions_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        owner_id: Uuid,
        date: NaiveDate,
    ) -> Result<(), CoreError> {
        let remaining: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT id, position FROM task_instances WHERE owner_id = $1 AND date = $2 ORDER BY position, created_at"
        )
        .bind(owner_id)
        .bind(date)
        .fetch_all(&mut **tx)
        .await?;

        for (expected, (id, position)) in remaining.into_iter().enumerate() {
            let expected = expected as i64;
            if position == expected {
                continue;
            }
            sqlx::query("UPDATE task_instances SET position = $1 WHERE id = $2")
                .bind(expected)
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}
