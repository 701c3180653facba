use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Keyed by the canonical pair, so the map itself is the uniqueness constraint.
pub struct MemoryFriendshipRepo {
    rows: DashMap<UserPair, Friendship>,
}

impl MemoryFriendshipRepo {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl FriendshipRepo for MemoryFriendshipRepo {
    async fn insert(&self, pair: UserPair) -> Result<Friendship, RelationError> {
        if pair.is_degenerate() {
            return Err(RelationError::InvalidArgument(
                "cannot befriend self".to_string(),
            ));
        }

        match self.rows.entry(pair) {
            Entry::Occupied(_) => Err(RelationError::Conflict(format!(
                "friendship {}:{} already exists",
                pair.low(),
                pair.high()
            ))),
            Entry::Vacant(slot) => {
                let friendship = Friendship::new(pair, Utc::now());
                slot.insert(friendship.clone());
                Ok(friendship)
            }
        }
    }

    async fn delete(&self, pair: UserPair) -> Result<bool, RelationError> {
        Ok(self.rows.remove(&pair).is_some())
    }

    async fn exists(&self, pair: UserPair) -> Result<bool, RelationError> {
        Ok(self.rows.contains_key(&pair))
    }

    async fn list_friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        let mut ids: Vec<UserId> = self
            .rows
            .iter()
            .filter_map(|entry| entry.key().other(user_id))
            .collect();
        ids.sort();
        Ok(ids)
    }
}
