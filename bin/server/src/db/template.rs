//! Workflow templates.

use super::{from_json, parse_id, store_error, to_json};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_core::TemplateId;
use docflow_workflow::{StoreError, TemplateStore, WorkflowTemplate};
use sqlx::{FromRow, PgPool};

/// Row type for template queries.
#[derive(FromRow)]
struct TemplateRow {
    id: String,
    name: String,
    description: Option<String>,
    stages: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TemplateRow {
    fn try_into_template(self) -> Result<WorkflowTemplate, sqlx::Error> {
        Ok(WorkflowTemplate {
            id: parse_id("template id", &self.id)?,
            stages: from_json("template stages", &self.id, self.stages)?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Template store backed by the `workflow_templates` table.
///
/// Stages are kept as JSONB in their wire shape and re-validated on read.
#[derive(Clone)]
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_row(&self, template: &WorkflowTemplate) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO workflow_templates (id, name, description, stages, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(template.id.to_string())
        .bind(&template.name)
        .bind(&template.description)
        .bind(to_json(&template.stages)?)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_row(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let row: Option<TemplateRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, stages, created_at, updated_at
            FROM workflow_templates
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TemplateRow::try_into_template).transpose()
    }

    async fn list_rows(&self) -> Result<Vec<WorkflowTemplate>, sqlx::Error> {
        let rows: Vec<TemplateRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, stages, created_at, updated_at
            FROM workflow_templates
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TemplateRow::try_into_template).collect()
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn insert(&self, template: &WorkflowTemplate) -> Result<(), StoreError> {
        self.insert_row(template).await.map_err(store_error)
    }

    async fn find(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, StoreError> {
        self.find_row(id).await.map_err(store_error)
    }

    async fn list(&self) -> Result<Vec<WorkflowTemplate>, StoreError> {
        self.list_rows().await.map_err(store_error)
    }

    async fn delete(&self, id: TemplateId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM workflow_templates WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }
}
