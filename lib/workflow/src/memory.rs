//! In-memory collaborators.
//!
//! Used by the engine tests, the server's router tests, and local runs
//! without a database. Every store can be switched to fail its calls so the
//! engine's best-effort paths can be exercised.

use crate::error::StoreError;
use crate::instance::{DocumentRef, Workflow};
use crate::notification::{Notice, Notification, NotificationInbox, NotificationSink};
use crate::selector::SubmittedDocument;
use crate::store::{
    DocumentGenerator, IndexEntry, TemplateStore, UserWorkflowIndex, WorkflowFilter, WorkflowStore,
};
use crate::template::WorkflowTemplate;
use async_trait::async_trait;
use chrono::Utc;
use docflow_core::{
    CommitteeId, DocumentId, NotificationId, RoleId, TemplateId, UserId, WorkflowId,
};
use docflow_directory::{Committee, Directory, DirectoryAdmin, DirectoryError, User};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

fn check(unavailable: &AtomicBool) -> Result<(), StoreError> {
    if unavailable.load(Ordering::SeqCst) {
        return Err(StoreError::Unavailable {
            reason: "in-memory store switched off".to_string(),
        });
    }
    Ok(())
}

/// Users and committees kept in insertion order.
#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<Vec<User>>,
    committees: Mutex<Vec<Committee>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user, keeping its original position.
    pub async fn add_user(&self, user: User) {
        let mut users = self.users.lock().await;
        match users.iter_mut().find(|u| u.id() == user.id()) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
    }

    /// Adds or replaces a committee.
    pub async fn add_committee(&self, committee: Committee) {
        let mut committees = self.committees.lock().await;
        match committees.iter_mut().find(|c| c.id == committee.id) {
            Some(existing) => *existing = committee,
            None => committees.push(committee),
        }
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn find_users_by_role(&self, role: RoleId) -> Result<Vec<User>, DirectoryError> {
        let users = self.users.lock().await;
        Ok(users.iter().filter(|u| u.has_role(role)).cloned().collect())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.id() == id).cloned())
    }

    async fn find_committee(&self, id: CommitteeId) -> Result<Option<Committee>, DirectoryError> {
        let committees = self.committees.lock().await;
        Ok(committees.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl DirectoryAdmin for MemoryDirectory {
    async fn save_user(&self, user: &User) -> Result<(), DirectoryError> {
        self.add_user(user.clone()).await;
        Ok(())
    }

    async fn save_committee(&self, committee: &Committee) -> Result<(), DirectoryError> {
        self.add_committee(committee.clone()).await;
        Ok(())
    }
}

/// Templates kept in insertion order.
#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: Mutex<Vec<WorkflowTemplate>>,
}

impl MemoryTemplateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn insert(&self, template: &WorkflowTemplate) -> Result<(), StoreError> {
        self.templates.lock().await.push(template.clone());
        Ok(())
    }

    async fn find(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, StoreError> {
        let templates = self.templates.lock().await;
        Ok(templates.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<WorkflowTemplate>, StoreError> {
        Ok(self.templates.lock().await.clone())
    }

    async fn delete(&self, id: TemplateId) -> Result<bool, StoreError> {
        let mut templates = self.templates.lock().await;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        Ok(templates.len() != before)
    }
}

/// Workflows with version checking.
#[derive(Default)]
pub struct MemoryWorkflowStore {
    workflows: Mutex<Vec<Workflow>>,
    unavailable: AtomicBool,
}

impl MemoryWorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    async fn insert(&self, workflow: &Workflow) -> Result<(), StoreError> {
        check(&self.unavailable)?;
        self.workflows.lock().await.push(workflow.clone());
        Ok(())
    }

    async fn find(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        check(&self.unavailable)?;
        let workflows = self.workflows.lock().await;
        Ok(workflows.iter().find(|w| w.id == id).cloned())
    }

    async fn list(&self, filter: &WorkflowFilter) -> Result<Vec<Workflow>, StoreError> {
        check(&self.unavailable)?;
        let workflows = self.workflows.lock().await;
        Ok(workflows
            .iter()
            .rev()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect())
    }

    async fn update(&self, workflow: &Workflow, expected_version: i64) -> Result<i64, StoreError> {
        check(&self.unavailable)?;
        let mut workflows = self.workflows.lock().await;
        let stored = workflows
            .iter_mut()
            .find(|w| w.id == workflow.id && w.version == expected_version)
            .ok_or(StoreError::VersionConflict {
                workflow_id: workflow.id,
                expected: expected_version,
            })?;
        *stored = workflow.clone();
        stored.version = expected_version + 1;
        Ok(stored.version)
    }

    async fn delete(&self, id: WorkflowId) -> Result<bool, StoreError> {
        check(&self.unavailable)?;
        let mut workflows = self.workflows.lock().await;
        let before = workflows.len();
        workflows.retain(|w| w.id != id);
        Ok(workflows.len() != before)
    }
}

/// Index entries, most recently touched last.
#[derive(Default)]
pub struct MemoryUserWorkflowIndex {
    entries: Mutex<Vec<IndexEntry>>,
    unavailable: AtomicBool,
}

impl MemoryUserWorkflowIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns every entry for a workflow.
    pub async fn entries_for_workflow(&self, workflow_id: WorkflowId) -> Vec<IndexEntry> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserWorkflowIndex for MemoryUserWorkflowIndex {
    async fn upsert(
        &self,
        user_id: UserId,
        workflow_id: WorkflowId,
        is_active: bool,
    ) -> Result<(), StoreError> {
        check(&self.unavailable)?;
        let mut entries = self.entries.lock().await;
        entries.retain(|e| !(e.user_id == user_id && e.workflow_id == workflow_id));
        entries.push(IndexEntry {
            user_id,
            workflow_id,
            is_active,
            updated_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<IndexEntry>, StoreError> {
        check(&self.unavailable)?;
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_active(
        &self,
        user_id: UserId,
        workflow_id: WorkflowId,
        is_active: bool,
    ) -> Result<bool, StoreError> {
        check(&self.unavailable)?;
        let mut entries = self.entries.lock().await;
        let Some(pos) = entries
            .iter()
            .position(|e| e.user_id == user_id && e.workflow_id == workflow_id)
        else {
            return Ok(false);
        };
        let mut entry = entries.remove(pos);
        entry.is_active = is_active;
        entry.updated_at = Utc::now();
        entries.push(entry);
        Ok(true)
    }

    async fn remove_workflow(&self, workflow_id: WorkflowId) -> Result<(), StoreError> {
        check(&self.unavailable)?;
        self.entries
            .lock()
            .await
            .retain(|e| e.workflow_id != workflow_id);
        Ok(())
    }
}

/// Keeps generated document references per workflow.
#[derive(Default)]
pub struct MemoryDocumentGenerator {
    stored: Mutex<Vec<(WorkflowId, DocumentRef)>>,
}

impl MemoryDocumentGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the documents currently kept for a workflow.
    pub async fn stored_for(&self, workflow_id: WorkflowId) -> Vec<DocumentRef> {
        self.stored
            .lock()
            .await
            .iter()
            .filter(|(id, _)| *id == workflow_id)
            .map(|(_, document)| document.clone())
            .collect()
    }

    /// Returns true if no documents are kept for any workflow.
    pub async fn is_empty(&self) -> bool {
        self.stored.lock().await.is_empty()
    }
}

#[async_trait]
impl DocumentGenerator for MemoryDocumentGenerator {
    async fn generate(
        &self,
        workflow_id: WorkflowId,
        documents: &[SubmittedDocument],
    ) -> Result<Vec<DocumentRef>, StoreError> {
        let now = Utc::now();
        let refs: Vec<DocumentRef> = documents
            .iter()
            .map(|d| DocumentRef {
                id: DocumentId::new(),
                title: d.title.clone(),
                created_at: now,
            })
            .collect();
        self.stored
            .lock()
            .await
            .extend(refs.iter().map(|r| (workflow_id, r.clone())));
        Ok(refs)
    }

    async fn discard(&self, workflow_id: WorkflowId) -> Result<(), StoreError> {
        self.stored.lock().await.retain(|(id, _)| *id != workflow_id);
        Ok(())
    }
}

/// Notification sink and inbox in one.
#[derive(Default)]
pub struct MemoryNotifications {
    delivered: Mutex<Vec<Notification>>,
    unavailable: AtomicBool,
}

impl MemoryNotifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `notify` fail while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns everything delivered so far, oldest first.
    pub async fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifications {
    async fn notify(&self, notice: Notice) -> Result<(), StoreError> {
        check(&self.unavailable)?;
        self.delivered.lock().await.push(notice.into());
        Ok(())
    }
}

#[async_trait]
impl NotificationInbox for MemoryNotifications {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, StoreError> {
        let delivered = self.delivered.lock().await;
        Ok(delivered
            .iter()
            .rev()
            .filter(|n| n.recipient_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<bool, StoreError> {
        let mut delivered = self.delivered.lock().await;
        match delivered
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == user_id)
        {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
