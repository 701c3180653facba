use super::util::{is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::str::FromStr;

pub struct MySqlMembershipRepo {
    pool: MySqlPool,
}

impl MySqlMembershipRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_member(r: &MySqlRow) -> Result<ConversationMember, RelationError> {
        let decode = store_err("decode member");
        let role: String = r.try_get("role").map_err(&decode)?;
        Ok(ConversationMember {
            conversation_id: r.try_get("conversation_id").map_err(&decode)?,
            user_id: r.try_get("user_id").map_err(&decode)?,
            role: MemberRole::from_str(&role).map_err(RelationError::Store)?,
            joined_at: r.try_get("joined_at").map_err(&decode)?,
        })
    }
}

#[async_trait::async_trait]
impl MembershipRepo for MySqlMembershipRepo {
    async fn insert_if_absent(
        &self,
        member: &ConversationMember,
    ) -> Result<MembershipClaim, RelationError> {
        let res = sqlx::query(
            r#"
INSERT INTO conversation_member (conversation_id, user_id, role, joined_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(member.conversation_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(MembershipClaim::Inserted(member.clone())),
            Err(e) if is_dup_key(&e) => {
                let existing = self
                    .get(member.conversation_id, member.user_id)
                    .await?
                    .ok_or_else(|| {
                        RelationError::Store(format!(
                            "member {} of {} removed while being added",
                            member.user_id, member.conversation_id
                        ))
                    })?;
                Ok(MembershipClaim::Existing(existing))
            }
            Err(e) => Err(RelationError::Store(format!("insert member: {e}"))),
        }
    }

    async fn delete(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, RelationError> {
        let res = sqlx::query(
            "DELETE FROM conversation_member WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("delete member"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn update_role(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<Option<RoleUpdate>, RelationError> {
        let res = sqlx::query(
            r#"
UPDATE conversation_member
SET role = ?
WHERE conversation_id = ? AND user_id = ? AND role <> ?
"#,
        )
        .bind(role.as_str())
        .bind(conversation_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(store_err("update member role"))?;

        let changed = res.rows_affected() > 0;
        Ok(self
            .get(conversation_id, user_id)
            .await?
            .map(|member| RoleUpdate { member, changed }))
    }

    async fn get(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<ConversationMember>, RelationError> {
        let row = sqlx::query(
            r#"
SELECT conversation_id, user_id, role, joined_at
FROM conversation_member
WHERE conversation_id = ? AND user_id = ?
"#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("select member"))?;

        row.as_ref().map(Self::row_to_member).transpose()
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMember>, RelationError> {
        let rows = sqlx::query(
            r#"
SELECT conversation_id, user_id, role, joined_at
FROM conversation_member
WHERE conversation_id = ?
ORDER BY joined_at, user_id
"#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("list members"))?;

        rows.iter().map(Self::row_to_member).collect()
    }

    async fn list_conversation_ids(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationId>, RelationError> {
        let rows = sqlx::query(
            "SELECT conversation_id FROM conversation_member WHERE user_id = ? ORDER BY conversation_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("list conversations of user"))?;

        rows.iter()
            .map(|row| row.try_get::<ConversationId, _>("conversation_id"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err("decode conversation id"))
    }
}
