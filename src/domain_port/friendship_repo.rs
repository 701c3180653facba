use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait FriendshipRepo: Send + Sync {
    /// A duplicate key on the canonical pair surfaces as `RelationError::Conflict`.
    async fn insert(&self, pair: UserPair) -> Result<Friendship, RelationError>;
    async fn delete(&self, pair: UserPair) -> Result<bool, RelationError>;
    async fn exists(&self, pair: UserPair) -> Result<bool, RelationError>;
    async fn list_friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError>;
}
