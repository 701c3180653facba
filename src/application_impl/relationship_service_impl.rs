use crate::application_impl::StoreDeadline;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::FriendshipRepo;
use std::collections::HashSet;
use std::sync::Arc;

pub struct RealFriendshipService {
    friendship_repo: Arc<dyn FriendshipRepo>,
    event_gateway: Arc<dyn EventGateway>,
    deadline: StoreDeadline,
}

impl RealFriendshipService {
    pub fn new(
        friendship_repo: Arc<dyn FriendshipRepo>,
        event_gateway: Arc<dyn EventGateway>,
        deadline: StoreDeadline,
    ) -> Self {
        Self {
            friendship_repo,
            event_gateway,
            deadline,
        }
    }

    fn distinct_pair(a: UserId, b: UserId) -> Result<UserPair, RelationError> {
        let pair = UserPair::new(a, b);
        if pair.is_degenerate() {
            return Err(RelationError::InvalidArgument(format!(
                "user {a} cannot be paired with self"
            )));
        }
        Ok(pair)
    }
}

#[async_trait::async_trait]
impl FriendshipService for RealFriendshipService {
    async fn add_friend(&self, a: UserId, b: UserId) -> Result<Friendship, RelationError> {
        let pair = Self::distinct_pair(a, b)?;
        let friendship = self.deadline.run(self.friendship_repo.insert(pair)).await?;

        tracing::info!("friendship created: {} <-> {}", pair.low(), pair.high());
        self.event_gateway.emit(
            Channel::FriendshipCreated,
            vec![pair.low(), pair.high()],
            &FriendshipChanged {
                user_low: pair.low(),
                user_high: pair.high(),
            },
        );
        Ok(friendship)
    }

    async fn remove_friend(&self, a: UserId, b: UserId) -> Result<bool, RelationError> {
        let pair = Self::distinct_pair(a, b)?;
        let removed = self.deadline.run(self.friendship_repo.delete(pair)).await?;

        if removed {
            tracing::info!("friendship removed: {} <-> {}", pair.low(), pair.high());
            self.event_gateway.emit(
                Channel::FriendshipRemoved,
                vec![pair.low(), pair.high()],
                &FriendshipChanged {
                    user_low: pair.low(),
                    user_high: pair.high(),
                },
            );
        }
        Ok(removed)
    }

    async fn are_friends(&self, a: UserId, b: UserId) -> Result<bool, RelationError> {
        if a == b {
            return Ok(false);
        }
        self.deadline
            .run(self.friendship_repo.exists(UserPair::new(a, b)))
            .await
    }

    async fn list_friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        self.deadline
            .run(self.friendship_repo.list_friend_ids(user_id))
            .await
    }

    async fn common_friends(&self, a: UserId, b: UserId) -> Result<Vec<UserId>, RelationError> {
        let (of_a, of_b) = tokio::try_join!(
            self.deadline.run(self.friendship_repo.list_friend_ids(a)),
            self.deadline.run(self.friendship_repo.list_friend_ids(b)),
        )?;

        let of_b: HashSet<UserId> = of_b.into_iter().collect();
        let mut common: Vec<UserId> = of_a
            .into_iter()
            .filter(|id| of_b.contains(id) && *id != a && *id != b)
            .collect();
        common.sort();
        Ok(common)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::RecordingEventGateway;
    use crate::infra_memory::MemoryFriendshipRepo;

    fn user() -> UserId {
        UserId(uuid::Uuid::new_v4())
    }

    fn service() -> (RealFriendshipService, Arc<RecordingEventGateway>) {
        let events = Arc::new(RecordingEventGateway::new());
        let svc = RealFriendshipService::new(
            Arc::new(MemoryFriendshipRepo::new()),
            events.clone(),
            StoreDeadline::default(),
        );
        (svc, events)
    }

    #[tokio::test]
    async fn friendship_is_symmetric() {
        let (svc, _) = service();
        let (a, b) = (user(), user());

        svc.add_friend(b, a).await.unwrap();

        assert!(svc.are_friends(a, b).await.unwrap());
        assert!(svc.are_friends(b, a).await.unwrap());
        assert_eq!(svc.list_friend_ids(a).await.unwrap(), vec![b]);
        assert_eq!(svc.list_friend_ids(b).await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn second_add_in_either_order_conflicts_and_publishes_once() {
        let (svc, events) = service();
        let (a, b) = (user(), user());

        svc.add_friend(a, b).await.unwrap();
        let err = svc.add_friend(b, a).await.unwrap_err();

        assert!(err.is_conflict());
        let created = events.on(Channel::FriendshipCreated);
        assert_eq!(created.len(), 1);
        let mut receivers = created[0].receivers.clone();
        receivers.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(receivers, expected);
    }

    #[tokio::test]
    async fn self_friendship_is_invalid() {
        let (svc, events) = service();
        let a = user();

        let err = svc.add_friend(a, a).await.unwrap_err();

        assert!(matches!(err, RelationError::InvalidArgument(_)));
        assert!(!svc.are_friends(a, a).await.unwrap());
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn remove_is_idempotent_and_publishes_only_on_change() {
        let (svc, events) = service();
        let (a, b) = (user(), user());
        svc.add_friend(a, b).await.unwrap();

        assert!(svc.remove_friend(b, a).await.unwrap());
        assert!(!svc.remove_friend(a, b).await.unwrap());

        assert!(!svc.are_friends(a, b).await.unwrap());
        assert_eq!(events.on(Channel::FriendshipRemoved).len(), 1);
    }

    #[tokio::test]
    async fn common_friends_excludes_the_pair_itself() {
        let (svc, _) = service();
        let (a, b, c, d) = (user(), user(), user(), user());
        svc.add_friend(a, b).await.unwrap();
        svc.add_friend(a, c).await.unwrap();
        svc.add_friend(b, c).await.unwrap();
        svc.add_friend(a, d).await.unwrap();

        assert_eq!(svc.common_friends(a, b).await.unwrap(), vec![c]);
        assert!(svc.common_friends(c, d).await.unwrap() == vec![a]);
    }
}
