use crate::error::CoreError;
use crate::models::RecurringTemplate;
use crate::repository::rows::{encode_subtasks, templates_from_rows, TemplateRow};
use crate::repository::{SqliteRepository, TemplateStore};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
impl TemplateStore for SqliteRepository {
    async fn insert_template(&self, template: &RecurringTemplate) -> Result<RecurringTemplate, CoreError> {
        let subtasks = encode_subtasks(&template.subtasks)?;

        sqlx::query(
            r#"INSERT INTO recurring_templates (id, owner_id, title, description, priority, tag, subtasks,
                recurrence_type, recurrence_interval, day_of_week, day_of_month, month_of_year,
                start_date, end_date, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"#
        )
        .bind(template.id)
        .bind(template.owner_id)
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.priority)
        .bind(&template.tag)
        .bind(subtasks)
        .bind(template.rule.recurrence_type)
        .bind(template.rule.interval as i64)
        .bind(template.rule.day_of_week.map(i64::from))
        .bind(template.rule.day_of_month.map(i64::from))
        .bind(template.rule.month_of_year.map(i64::from))
        .bind(template.start_date)
        .bind(template.end_date)
        .bind(template.active)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(self.pool())
        .await?;

        Ok(template.clone())
    }

    async fn find_template_by_id(&self, id: Uuid) -> Result<Option<RecurringTemplate>, CoreError> {
        let row: Option<TemplateRow> = sqlx::query_as("SELECT * FROM recurring_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(RecurringTemplate::try_from).transpose()
    }

    async fn find_templates_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringTemplate>, CoreError> {
        let rows: Vec<TemplateRow> = sqlx::query_as(
            "SELECT * FROM recurring_templates WHERE owner_id = $1 ORDER BY created_at, id"
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;
        templates_from_rows(rows)
    }

    async fn find_active_templates_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringTemplate>, CoreError> {
        let rows: Vec<TemplateRow> = sqlx::query_as(
            "SELECT * FROM recurring_templates WHERE owner_id = $1 AND active = 1 ORDER BY created_at, id"
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;
        templates_from_rows(rows)
    }

    async fn update_template(&self, template: &RecurringTemplate) -> Result<RecurringTemplate, CoreError> {
        let subtasks = encode_subtasks(&template.subtasks)?;

        // The pattern type and start date are fixed at creation and not rewritten here.
        let result = sqlx::query(
            r#"UPDATE recurring_templates SET
                title = $1, description = $2, priority = $3, tag = $4, subtasks = $5,
                recurrence_interval = $6, day_of_week = $7, day_of_month = $8, month_of_year = $9,
                end_date = $10, active = $11, updated_at = $12
            WHERE id = $13"#
        )
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.priority)
        .bind(&template.tag)
        .bind(subtasks)
        .bind(template.rule.interval as i64)
        .bind(template.rule.day_of_week.map(i64::from))
        .bind(template.rule.day_of_month.map(i64::from))
        .bind(template.rule.month_of_year.map(i64::from))
        .bind(template.end_date)
        .bind(template.active)
        .bind(template.updated_at)
        .bind(template.id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Template with id {} not found", template.id)));
        }

        self.find_template_by_id(template.id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Template with id {} not found", template.id)))
    }

    async fn delete_template(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM recurring_templates WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Template with id {} not found", id)));
        }
        Ok(())
    }
}
