use crate::domain_model::{UserId, UserPair};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Accepted, symmetric relationship. Created on accept, deleted on unfriend.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Friendship {
    pub user_low: UserId,
    pub user_high: UserId,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    pub fn new(pair: UserPair, created_at: DateTime<Utc>) -> Self {
        Self {
            user_low: pair.low(),
            user_high: pair.high(),
            created_at,
        }
    }

    pub fn pair(&self) -> UserPair {
        UserPair::new(self.user_low, self.user_high)
    }
}
