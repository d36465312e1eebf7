//! Notifications sent to workflow participants.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_core::{NotificationId, UserId, WorkflowId};
use serde::{Deserialize, Serialize};

/// A message to deliver to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub recipient: UserId,
    pub sender: UserId,
    pub message: String,
    pub workflow_id: WorkflowId,
}

/// A delivered notification as stored for its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub sender_id: UserId,
    pub message: String,
    pub workflow_id: WorkflowId,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notice> for Notification {
    fn from(notice: Notice) -> Self {
        Self {
            id: NotificationId::new(),
            recipient_id: notice.recipient,
            sender_id: notice.sender,
            message: notice.message,
            workflow_id: notice.workflow_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Delivers notices. Failures are reported but the engine never lets them
/// fail the operation that produced the notice.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notice: Notice) -> Result<(), StoreError>;
}

/// Read access to delivered notifications.
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    /// Lists a user's notifications, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, StoreError>;

    /// Marks a notification read. Returns false if the user has no such
    /// notification.
    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_becomes_unread_notification() {
        let notice = Notice {
            recipient: UserId::new(),
            sender: UserId::new(),
            message: "Workflow approved".to_string(),
            workflow_id: WorkflowId::new(),
        };
        let notification = Notification::from(notice.clone());
        assert_eq!(notification.recipient_id, notice.recipient);
        assert_eq!(notification.message, "Workflow approved");
        assert!(!notification.read);
    }
}
