//! Stores submitted forms as document records.

use super::{store_error, to_json};
use async_trait::async_trait;
use chrono::Utc;
use docflow_core::{DocumentId, WorkflowId};
use docflow_workflow::{DocumentGenerator, DocumentRef, StoreError, SubmittedDocument};
use sqlx::PgPool;

/// Document generator writing each submission to the `documents` table.
///
/// The submitted form is kept verbatim as the document payload.
#[derive(Clone)]
pub struct PgDocumentGenerator {
    pool: PgPool,
}

impl PgDocumentGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn store_all(
        &self,
        workflow_id: WorkflowId,
        documents: &[SubmittedDocument],
    ) -> Result<Vec<DocumentRef>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut refs = Vec::with_capacity(documents.len());
        for document in documents {
            let reference = DocumentRef {
                id: DocumentId::new(),
                title: document.title.clone(),
                created_at: Utc::now(),
            };
            sqlx::query(
                r#"
                INSERT INTO documents (id, workflow_id, title, payload, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(reference.id.to_string())
            .bind(workflow_id.to_string())
            .bind(&reference.title)
            .bind(to_json(document)?)
            .bind(reference.created_at)
            .execute(&mut *tx)
            .await?;
            refs.push(reference);
        }
        tx.commit().await?;
        Ok(refs)
    }
}

#[async_trait]
impl DocumentGenerator for PgDocumentGenerator {
    async fn generate(
        &self,
        workflow_id: WorkflowId,
        documents: &[SubmittedDocument],
    ) -> Result<Vec<DocumentRef>, StoreError> {
        self.store_all(workflow_id, documents)
            .await
            .map_err(store_error)
    }

    async fn discard(&self, workflow_id: WorkflowId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE workflow_id = $1")
            .bind(workflow_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
