use crate::domain_model::*;

/// Error taxonomy shared by every component of the core. Storage errors are
/// translated into these variants at the component boundary; `Store` covers a
/// backend that failed or missed its deadline.
#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(String),
}

impl RelationError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RelationError::Conflict(_))
    }
}

#[async_trait::async_trait]
pub trait FriendshipService: Send + Sync {
    /// Fails with `Conflict` when the pair is already friends, including when
    /// a concurrent insert won the race.
    async fn add_friend(&self, a: UserId, b: UserId) -> Result<Friendship, RelationError>;
    async fn remove_friend(&self, a: UserId, b: UserId) -> Result<bool, RelationError>;
    async fn are_friends(&self, a: UserId, b: UserId) -> Result<bool, RelationError>;
    async fn list_friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError>;
    async fn common_friends(&self, a: UserId, b: UserId) -> Result<Vec<UserId>, RelationError>;
}
