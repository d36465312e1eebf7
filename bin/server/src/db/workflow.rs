//! Workflow instances.

use super::{decode_error, from_json, parse_id, store_error, to_index, to_json};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_core::WorkflowId;
use docflow_workflow::{StoreError, Workflow, WorkflowFilter, WorkflowStatus, WorkflowStore};
use sqlx::{FromRow, PgPool};

/// Row type for workflow queries.
#[derive(FromRow)]
struct WorkflowRow {
    id: String,
    template_id: String,
    title: String,
    description: Option<String>,
    requester_id: String,
    status: String,
    current_stage_index: i32,
    assigned_users: serde_json::Value,
    documents: serde_json::Value,
    votes: serde_json::Value,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkflowRow {
    fn try_into_workflow(self) -> Result<Workflow, sqlx::Error> {
        let status: WorkflowStatus = self
            .status
            .parse()
            .map_err(|e| decode_error("workflow status", &self.status, e))?;

        Ok(Workflow {
            id: parse_id("workflow id", &self.id)?,
            template_id: parse_id("template id", &self.template_id)?,
            requester_id: parse_id("requester id", &self.requester_id)?,
            current_stage_index: to_index("stage index", &self.id, self.current_stage_index)?,
            assigned_users: from_json("assigned users", &self.id, self.assigned_users)?,
            documents: from_json("documents", &self.id, self.documents)?,
            votes: from_json("votes", &self.id, self.votes)?,
            title: self.title,
            description: self.description,
            status,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn stage_index_column(workflow: &Workflow) -> Result<i32, sqlx::Error> {
    i32::try_from(workflow.current_stage_index)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Workflow store backed by the `workflows` table.
#[derive(Clone)]
pub struct PgWorkflowStore {
    pool: PgPool,
}

impl PgWorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_row(&self, workflow: &Workflow) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO workflows (
                id, template_id, title, description, requester_id, status,
                current_stage_index, assigned_users, documents, votes, version,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(workflow.id.to_string())
        .bind(workflow.template_id.to_string())
        .bind(&workflow.title)
        .bind(&workflow.description)
        .bind(workflow.requester_id.to_string())
        .bind(workflow.status.as_str())
        .bind(stage_index_column(workflow)?)
        .bind(to_json(&workflow.assigned_users)?)
        .bind(to_json(&workflow.documents)?)
        .bind(to_json(&workflow.votes)?)
        .bind(workflow.version)
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_row(&self, id: WorkflowId) -> Result<Option<Workflow>, sqlx::Error> {
        let row: Option<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, template_id, title, description, requester_id, status,
                   current_stage_index, assigned_users, documents, votes, version,
                   created_at, updated_at
            FROM workflows
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkflowRow::try_into_workflow).transpose()
    }

    async fn list_rows(&self, filter: &WorkflowFilter) -> Result<Vec<Workflow>, sqlx::Error> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let rows: Vec<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, template_id, title, description, requester_id, status,
                   current_stage_index, assigned_users, documents, votes, version,
                   created_at, updated_at
            FROM workflows
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR requester_id = $2)
              AND ($3::TEXT IS NULL OR template_id = $3)
              AND ($4::TEXT IS NULL OR title ILIKE '%' || $4 || '%')
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.requester.map(|r| r.to_string()))
        .bind(filter.template.map(|t| t.to_string()))
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorkflowRow::try_into_workflow).collect()
    }

    async fn update_row(&self, workflow: &Workflow, expected_version: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE workflows
            SET title = $3, description = $4, status = $5, current_stage_index = $6,
                assigned_users = $7, documents = $8, votes = $9,
                version = version + 1, updated_at = $10
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(workflow.id.to_string())
        .bind(expected_version)
        .bind(&workflow.title)
        .bind(&workflow.description)
        .bind(workflow.status.as_str())
        .bind(stage_index_column(workflow)?)
        .bind(to_json(&workflow.assigned_users)?)
        .bind(to_json(&workflow.documents)?)
        .bind(to_json(&workflow.votes)?)
        .bind(workflow.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    async fn insert(&self, workflow: &Workflow) -> Result<(), StoreError> {
        self.insert_row(workflow).await.map_err(store_error)
    }

    async fn find(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        self.find_row(id).await.map_err(store_error)
    }

    async fn list(&self, filter: &WorkflowFilter) -> Result<Vec<Workflow>, StoreError> {
        self.list_rows(filter).await.map_err(store_error)
    }

    async fn update(&self, workflow: &Workflow, expected_version: i64) -> Result<i64, StoreError> {
        let updated = self
            .update_row(workflow, expected_version)
            .await
            .map_err(store_error)?;
        if updated == 0 {
            return Err(StoreError::VersionConflict {
                workflow_id: workflow.id,
                expected: expected_version,
            });
        }
        Ok(expected_version + 1)
    }

    async fn delete(&self, id: WorkflowId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }
}
