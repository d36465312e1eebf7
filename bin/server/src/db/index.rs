//! The per-user workflow index.

use super::{parse_id, store_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_core::{UserId, WorkflowId};
use docflow_workflow::{IndexEntry, StoreError, UserWorkflowIndex};
use sqlx::{FromRow, PgPool};

#[derive(FromRow)]
struct IndexRow {
    user_id: String,
    workflow_id: String,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl IndexRow {
    fn try_into_entry(self) -> Result<IndexEntry, sqlx::Error> {
        Ok(IndexEntry {
            user_id: parse_id("user id", &self.user_id)?,
            workflow_id: parse_id("workflow id", &self.workflow_id)?,
            is_active: self.is_active,
            updated_at: self.updated_at,
        })
    }
}

/// Index backed by the `user_workflows` table, keyed by
/// `(user_id, workflow_id)`.
#[derive(Clone)]
pub struct PgUserWorkflowIndex {
    pool: PgPool,
}

impl PgUserWorkflowIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserWorkflowIndex for PgUserWorkflowIndex {
    async fn upsert(
        &self,
        user_id: UserId,
        workflow_id: WorkflowId,
        is_active: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_workflows (user_id, workflow_id, is_active, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, workflow_id)
            DO UPDATE SET is_active = $3, updated_at = $4
            "#,
        )
        .bind(user_id.to_string())
        .bind(workflow_id.to_string())
        .bind(is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<IndexEntry>, StoreError> {
        let rows: Vec<IndexRow> = sqlx::query_as(
            r#"
            SELECT user_id, workflow_id, is_active, updated_at
            FROM user_workflows
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(IndexRow::try_into_entry)
            .collect::<Result<_, _>>()
            .map_err(store_error)
    }

    async fn set_active(
        &self,
        user_id: UserId,
        workflow_id: WorkflowId,
        is_active: bool,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE user_workflows
            SET is_active = $3, updated_at = $4
            WHERE user_id = $1 AND workflow_id = $2
            "#,
        )
        .bind(user_id.to_string())
        .bind(workflow_id.to_string())
        .bind(is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_workflow(&self, workflow_id: WorkflowId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM user_workflows WHERE workflow_id = $1")
            .bind(workflow_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
