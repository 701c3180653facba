use super::util::{is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use sqlx::{MySqlPool, Row};

pub struct MySqlFriendshipRepo {
    pool: MySqlPool,
}

impl MySqlFriendshipRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FriendshipRepo for MySqlFriendshipRepo {
    async fn insert(&self, pair: UserPair) -> Result<Friendship, RelationError> {
        if pair.is_degenerate() {
            return Err(RelationError::InvalidArgument(
                "cannot befriend self".to_string(),
            ));
        }

        let friendship = Friendship::new(pair, Utc::now());
        let res = sqlx::query(
            r#"
INSERT INTO friendship (user_low, user_high, created_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(friendship.user_low)
        .bind(friendship.user_high)
        .bind(friendship.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(friendship),
            Err(e) if is_dup_key(&e) => Err(RelationError::Conflict(format!(
                "friendship {}:{} already exists",
                pair.low(),
                pair.high()
            ))),
            Err(e) => Err(RelationError::Store(format!("insert friendship: {e}"))),
        }
    }

    async fn delete(&self, pair: UserPair) -> Result<bool, RelationError> {
        let res = sqlx::query("DELETE FROM friendship WHERE user_low = ? AND user_high = ?")
            .bind(pair.low())
            .bind(pair.high())
            .execute(&self.pool)
            .await
            .map_err(store_err("delete friendship"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn exists(&self, pair: UserPair) -> Result<bool, RelationError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM friendship WHERE user_low = ? AND user_high = ?",
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("query friendship"))?;

        Ok(count > 0)
    }

    async fn list_friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        let rows = sqlx::query(
            r#"
SELECT user_high AS friend FROM friendship WHERE user_low = ?
UNION ALL
SELECT user_low AS friend FROM friendship WHERE user_high = ?
"#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("list friends"))?;

        let mut ids = rows
            .iter()
            .map(|row| row.try_get::<UserId, _>("friend"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err("decode friend id"))?;
        ids.sort();
        Ok(ids)
    }
}
