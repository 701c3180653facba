use super::util::{is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

pub struct MySqlConversationRepo {
    pool: MySqlPool,
}

impl MySqlConversationRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_conversation(r: &MySqlRow) -> Result<Conversation, RelationError> {
        let decode = store_err("decode conversation");
        let kind: String = r.try_get("kind").map_err(&decode)?;
        Ok(Conversation {
            conversation_id: r.try_get("conversation_id").map_err(&decode)?,
            kind: ConversationKind::from_str(&kind).map_err(RelationError::Store)?,
            pinned_messages: BTreeSet::new(),
            is_deleted_by: BTreeSet::new(),
            last_message: r.try_get("last_message").map_err(&decode)?,
            created_at: r.try_get("created_at").map_err(&decode)?,
        })
    }

    async fn exists(&self, conversation_id: ConversationId) -> Result<bool, RelationError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM conversation WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await
                .map_err(store_err("query conversation"))?;
        Ok(count > 0)
    }

    async fn find_private_by_pair(
        &self,
        pair: UserPair,
    ) -> Result<Option<Conversation>, RelationError> {
        let id: Option<ConversationId> = sqlx::query_scalar(
            "SELECT conversation_id FROM conversation WHERE private_low = ? AND private_high = ?",
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("select private conversation"))?;

        match id {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    /// Loads rows of `ids` with their pinned and hidden sets attached.
    async fn load(&self, ids: &[ConversationId]) -> Result<Vec<Conversation>, RelationError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT conversation_id, kind, last_message, created_at FROM conversation WHERE conversation_id IN (",
        );
        let mut list = qb.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");
        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("select conversations"))?;

        let mut by_id = HashMap::with_capacity(rows.len());
        for row in &rows {
            let conversation = Self::row_to_conversation(row)?;
            by_id.insert(conversation.conversation_id, conversation);
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT conversation_id, message_id FROM conversation_pin WHERE conversation_id IN (",
        );
        let mut list = qb.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");
        for row in qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("select pins"))?
        {
            let decode = store_err("decode pin");
            let conversation_id: ConversationId = row.try_get("conversation_id").map_err(&decode)?;
            let message_id: MessageId = row.try_get("message_id").map_err(&decode)?;
            if let Some(c) = by_id.get_mut(&conversation_id) {
                c.pinned_messages.insert(message_id);
            }
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT conversation_id, user_id FROM conversation_hidden WHERE conversation_id IN (",
        );
        let mut list = qb.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");
        for row in qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("select hidden"))?
        {
            let decode = store_err("decode hidden");
            let conversation_id: ConversationId = row.try_get("conversation_id").map_err(&decode)?;
            let user_id: UserId = row.try_get("user_id").map_err(&decode)?;
            if let Some(c) = by_id.get_mut(&conversation_id) {
                c.is_deleted_by.insert(user_id);
            }
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

#[async_trait::async_trait]
impl ConversationRepo for MySqlConversationRepo {
    async fn insert_private(
        &self,
        conversation: &Conversation,
        pair: UserPair,
    ) -> Result<PrivateConversationClaim, RelationError> {
        let res = sqlx::query(
            r#"
INSERT INTO conversation (conversation_id, kind, private_low, private_high, created_at)
VALUES (?, 'private', ?, ?, ?)
"#,
        )
        .bind(conversation.conversation_id)
        .bind(pair.low())
        .bind(pair.high())
        .bind(conversation.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(PrivateConversationClaim::Won(conversation.clone())),
            Err(e) if is_dup_key(&e) => {
                let existing = self.find_private_by_pair(pair).await?.ok_or_else(|| {
                    RelationError::Store(format!(
                        "private conversation {}:{} vanished after key collision",
                        pair.low(),
                        pair.high()
                    ))
                })?;
                Ok(PrivateConversationClaim::Existing(existing))
            }
            Err(e) => Err(RelationError::Store(format!("insert private conversation: {e}"))),
        }
    }

    async fn insert_group(&self, conversation: &Conversation) -> Result<(), RelationError> {
        sqlx::query(
            "INSERT INTO conversation (conversation_id, kind, created_at) VALUES (?, 'group', ?)",
        )
        .bind(conversation.conversation_id)
        .bind(conversation.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err("insert group conversation"))?;
        Ok(())
    }

    async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Conversation>, RelationError> {
        Ok(self.load(&[conversation_id]).await?.into_iter().next())
    }

    async fn get_many(
        &self,
        conversation_ids: &[ConversationId],
    ) -> Result<Vec<Conversation>, RelationError> {
        self.load(conversation_ids).await
    }

    async fn add_pinned(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<Option<bool>, RelationError> {
        if !self.exists(conversation_id).await? {
            return Ok(None);
        }
        let res = sqlx::query(
            r#"
INSERT IGNORE INTO conversation_pin (conversation_id, message_id, pinned_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(conversation_id)
        .bind(message_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_err("pin message"))?;

        Ok(Some(res.rows_affected() > 0))
    }

    async fn remove_pinned(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<Option<bool>, RelationError> {
        if !self.exists(conversation_id).await? {
            return Ok(None);
        }
        let res = sqlx::query(
            "DELETE FROM conversation_pin WHERE conversation_id = ? AND message_id = ?",
        )
        .bind(conversation_id)
        .bind(message_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("unpin message"))?;

        Ok(Some(res.rows_affected() > 0))
    }

    async fn set_last_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> Result<bool, RelationError> {
        // rows_affected is 0 when the value is unchanged, so existence is checked separately
        if !self.exists(conversation_id).await? {
            return Ok(false);
        }
        sqlx::query("UPDATE conversation SET last_message = ? WHERE conversation_id = ?")
            .bind(message_id)
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(store_err("update last message"))?;
        Ok(true)
    }
}
