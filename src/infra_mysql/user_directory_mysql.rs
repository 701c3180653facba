use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::{MySqlPool, Row};

/// Reads profiles from the directory's `user` table; never writes.
pub struct MySqlUserDirectory {
    pool: MySqlPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn lookup(&self, user_id: UserId) -> anyhow::Result<Option<UserProfile>> {
        let Some(row) = sqlx::query(
            "SELECT username, avatar_url FROM user WHERE user_id = ? AND is_active = 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        Ok(Some(UserProfile {
            user_id,
            username: row.try_get("username")?,
            avatar_url: row.try_get("avatar_url")?,
        }))
    }
}
