//! Shared application state.

use crate::db::{
    PgDirectory, PgDocumentGenerator, PgNotifications, PgTemplateStore, PgUserWorkflowIndex,
    PgWorkflowStore,
};
use docflow_directory::{Directory, DirectoryAdmin};
use docflow_workflow::memory::{
    MemoryDirectory, MemoryDocumentGenerator, MemoryNotifications, MemoryTemplateStore,
    MemoryUserWorkflowIndex, MemoryWorkflowStore,
};
use docflow_workflow::{Collaborators, EngineConfig, NotificationInbox, WorkflowEngine};
use sqlx::PgPool;
use std::sync::Arc;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
    pub directory: Arc<dyn Directory>,
    pub directory_admin: Arc<dyn DirectoryAdmin>,
    pub inbox: Arc<dyn NotificationInbox>,
}

impl AppState {
    /// Wires every collaborator to Postgres.
    pub fn postgres(pool: PgPool, config: EngineConfig) -> Self {
        let directory = Arc::new(PgDirectory::new(pool.clone()));
        let notifications = Arc::new(PgNotifications::new(pool.clone()));
        let engine = WorkflowEngine::new(
            Collaborators {
                templates: Arc::new(PgTemplateStore::new(pool.clone())),
                workflows: Arc::new(PgWorkflowStore::new(pool.clone())),
                index: Arc::new(PgUserWorkflowIndex::new(pool.clone())),
                directory: directory.clone(),
                documents: Arc::new(PgDocumentGenerator::new(pool)),
                notifications: notifications.clone(),
            },
            config,
        );
        Self {
            engine,
            directory: directory.clone(),
            directory_admin: directory,
            inbox: notifications,
        }
    }

    /// Wires every collaborator to in-memory stores.
    pub fn in_memory(config: EngineConfig) -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        let notifications = Arc::new(MemoryNotifications::new());
        let engine = WorkflowEngine::new(
            Collaborators {
                templates: Arc::new(MemoryTemplateStore::new()),
                workflows: Arc::new(MemoryWorkflowStore::new()),
                index: Arc::new(MemoryUserWorkflowIndex::new()),
                directory: directory.clone(),
                documents: Arc::new(MemoryDocumentGenerator::new()),
                notifications: notifications.clone(),
            },
            config,
        );
        Self {
            engine,
            directory: directory.clone(),
            directory_admin: directory,
            inbox: notifications,
        }
    }
}
