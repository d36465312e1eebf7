//! Notifications.

use super::{parse_id, store_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_core::{NotificationId, UserId};
use docflow_workflow::{Notice, Notification, NotificationInbox, NotificationSink, StoreError};
use sqlx::{FromRow, PgPool};

#[derive(FromRow)]
struct NotificationRow {
    id: String,
    recipient_id: String,
    sender_id: String,
    message: String,
    workflow_id: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn try_into_notification(self) -> Result<Notification, sqlx::Error> {
        Ok(Notification {
            id: parse_id("notification id", &self.id)?,
            recipient_id: parse_id("recipient id", &self.recipient_id)?,
            sender_id: parse_id("sender id", &self.sender_id)?,
            workflow_id: parse_id("workflow id", &self.workflow_id)?,
            message: self.message,
            read: self.read,
            created_at: self.created_at,
        })
    }
}

/// Notification sink and inbox backed by the `notifications` table.
#[derive(Clone)]
pub struct PgNotifications {
    pool: PgPool,
}

impl PgNotifications {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotifications {
    async fn notify(&self, notice: Notice) -> Result<(), StoreError> {
        let notification = Notification::from(notice);
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, sender_id, message, workflow_id, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id.to_string())
        .bind(notification.recipient_id.to_string())
        .bind(notification.sender_id.to_string())
        .bind(&notification.message)
        .bind(notification.workflow_id.to_string())
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }
}

#[async_trait]
impl NotificationInbox for PgNotifications {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, StoreError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, recipient_id, sender_id, message, workflow_id, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(NotificationRow::try_into_notification)
            .collect::<Result<_, _>>()
            .map_err(store_error)
    }

    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }
}
