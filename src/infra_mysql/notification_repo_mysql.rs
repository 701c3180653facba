use super::util::{is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::str::FromStr;

const COLUMNS: &str = r#"
notification_id, sender, receiver, kind, post_id, comment_id, group_id, message_id,
request_id, is_read, is_deleted, deleted_at, created_at
"#;

pub struct MySqlNotificationRepo {
    pool: MySqlPool,
}

impl MySqlNotificationRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_notification(r: &MySqlRow) -> Result<Notification, RelationError> {
        let decode = store_err("decode notification");
        let kind: String = r.try_get("kind").map_err(&decode)?;
        Ok(Notification {
            notification_id: r.try_get("notification_id").map_err(&decode)?,
            sender: r.try_get("sender").map_err(&decode)?,
            receiver: r.try_get("receiver").map_err(&decode)?,
            kind: NotificationKind::from_str(&kind).map_err(RelationError::Store)?,
            extra: NotificationExtra {
                post_id: r.try_get("post_id").map_err(&decode)?,
                comment_id: r.try_get("comment_id").map_err(&decode)?,
                group_id: r.try_get("group_id").map_err(&decode)?,
                message_id: r.try_get("message_id").map_err(&decode)?,
                request_id: r.try_get("request_id").map_err(&decode)?,
            },
            is_read: r.try_get("is_read").map_err(&decode)?,
            is_deleted: r.try_get("is_deleted").map_err(&decode)?,
            deleted_at: r.try_get("deleted_at").map_err(&decode)?,
            created_at: r.try_get("created_at").map_err(&decode)?,
        })
    }

    async fn try_insert(&self, notification: &Notification) -> Result<(), sqlx::Error> {
        let target = notification
            .extra
            .target()
            .unwrap_or_else(uuid::Uuid::nil);

        sqlx::query(
            r#"
INSERT INTO notification (
    notification_id, sender, receiver, kind, post_id, comment_id, group_id, message_id,
    request_id, is_read, is_deleted, deleted_at, created_at, dedup_target
)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(notification.notification_id)
        .bind(notification.sender)
        .bind(notification.receiver)
        .bind(notification.kind.as_str())
        .bind(notification.extra.post_id)
        .bind(notification.extra.comment_id)
        .bind(notification.extra.group_id)
        .bind(notification.extra.message_id)
        .bind(notification.extra.request_id)
        .bind(notification.is_read)
        .bind(notification.is_deleted)
        .bind(notification.deleted_at)
        .bind(notification.created_at)
        .bind(target)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl NotificationRepo for MySqlNotificationRepo {
    async fn insert(
        &self,
        notification: &Notification,
    ) -> Result<NotificationClaim, RelationError> {
        let Some(key) = notification.dedup_key() else {
            self.try_insert(notification)
                .await
                .map_err(store_err("insert notification"))?;
            return Ok(NotificationClaim::Created(notification.clone()));
        };

        // a collision whose holder was tombstoned before we could read it is retried once
        for _ in 0..2 {
            match self.try_insert(notification).await {
                Ok(()) => return Ok(NotificationClaim::Created(notification.clone())),
                Err(e) if is_dup_key(&e) => {
                    if let Some(existing) = self.find_active(&key).await? {
                        return Ok(NotificationClaim::Existing(existing));
                    }
                }
                Err(e) => return Err(RelationError::Store(format!("insert notification: {e}"))),
            }
        }

        Err(RelationError::Store(format!(
            "notification {} kept colliding with a vanishing row",
            notification.notification_id
        )))
    }

    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<Notification>, RelationError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM notification WHERE notification_id = ?"
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("select notification"))?;

        row.as_ref().map(Self::row_to_notification).transpose()
    }

    async fn find_active(&self, key: &DedupKey) -> Result<Option<Notification>, RelationError> {
        let row = sqlx::query(&format!(
            r#"
SELECT {COLUMNS}
FROM notification
WHERE sender = ? AND receiver = ? AND kind = ? AND dedup_target = ? AND dedup_active = 1
"#
        ))
        .bind(key.sender)
        .bind(key.receiver)
        .bind(key.kind.as_str())
        .bind(key.target.unwrap_or_else(uuid::Uuid::nil))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("select active notification"))?;

        row.as_ref().map(Self::row_to_notification).transpose()
    }

    async fn mark_read(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<StateChange>, RelationError> {
        let res = sqlx::query(
            r#"
UPDATE notification
SET is_read = 1
WHERE notification_id = ? AND is_deleted = 0 AND is_read = 0
"#,
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("mark notification read"))?;

        let changed = res.rows_affected() > 0;
        Ok(self
            .get(notification_id)
            .await?
            .filter(|n| n.is_active())
            .map(|notification| StateChange {
                notification,
                changed,
            }))
    }

    async fn mark_all_read(&self, receiver: UserId) -> Result<u64, RelationError> {
        let res = sqlx::query(
            r#"
UPDATE notification
SET is_read = 1
WHERE receiver = ? AND is_deleted = 0 AND is_read = 0
"#,
        )
        .bind(receiver)
        .execute(&self.pool)
        .await
        .map_err(store_err("mark all read"))?;

        Ok(res.rows_affected())
    }

    async fn tombstone(
        &self,
        notification_id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Option<StateChange>, RelationError> {
        let res = sqlx::query(
            r#"
UPDATE notification
SET is_deleted = 1, deleted_at = ?
WHERE notification_id = ? AND is_deleted = 0
"#,
        )
        .bind(at)
        .bind(notification_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("tombstone notification"))?;

        let changed = res.rows_affected() > 0;
        Ok(self
            .get(notification_id)
            .await?
            .map(|notification| StateChange {
                notification,
                changed,
            }))
    }

    async fn tombstone_all(
        &self,
        receiver: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RelationError> {
        let res = sqlx::query(
            r#"
UPDATE notification
SET is_deleted = 1, deleted_at = ?
WHERE receiver = ? AND is_deleted = 0
"#,
        )
        .bind(at)
        .bind(receiver)
        .execute(&self.pool)
        .await
        .map_err(store_err("tombstone all notifications"))?;

        Ok(res.rows_affected())
    }

    async fn list_active(
        &self,
        receiver: UserId,
        page_size: PageSize,
        before: Option<NotificationCursor>,
    ) -> Result<Vec<Notification>, RelationError> {
        let limit = page_size.clamped().0 as i64;

        let rows = match before {
            None => sqlx::query(&format!(
                r#"
SELECT {COLUMNS}
FROM notification
WHERE receiver = ? AND is_deleted = 0
ORDER BY created_at DESC, notification_id DESC
LIMIT ?
"#
            ))
            .bind(receiver)
            .bind(limit)
            .fetch_all(&self.pool)
            .await,
            Some(cur) => sqlx::query(&format!(
                r#"
SELECT {COLUMNS}
FROM notification
WHERE receiver = ? AND is_deleted = 0
  AND (created_at < ? OR (created_at = ? AND notification_id < ?))
ORDER BY created_at DESC, notification_id DESC
LIMIT ?
"#
            ))
            .bind(receiver)
            .bind(cur.created_at)
            .bind(cur.created_at)
            .bind(cur.notification_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(store_err("list notifications"))?;

        rows.iter().map(Self::row_to_notification).collect()
    }

    async fn count_unread(&self, receiver: UserId) -> Result<u64, RelationError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification WHERE receiver = ? AND is_deleted = 0 AND is_read = 0",
        )
        .bind(receiver)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("count unread"))?;

        Ok(count as u64)
    }
}
