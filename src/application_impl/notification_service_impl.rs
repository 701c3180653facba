use crate::application_impl::StoreDeadline;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{NotificationClaim, NotificationRepo, UserDirectory};
use chrono::Utc;
use std::sync::Arc;

pub struct RealNotificationService {
    notification_repo: Arc<dyn NotificationRepo>,
    friendship_service: Arc<dyn FriendshipService>,
    membership_service: Arc<dyn MembershipService>,
    user_directory: Arc<dyn UserDirectory>,
    event_gateway: Arc<dyn EventGateway>,
    deadline: StoreDeadline,
}

impl RealNotificationService {
    pub fn new(
        notification_repo: Arc<dyn NotificationRepo>,
        friendship_service: Arc<dyn FriendshipService>,
        membership_service: Arc<dyn MembershipService>,
        user_directory: Arc<dyn UserDirectory>,
        event_gateway: Arc<dyn EventGateway>,
        deadline: StoreDeadline,
    ) -> Self {
        Self {
            notification_repo,
            friendship_service,
            membership_service,
            user_directory,
            event_gateway,
            deadline,
        }
    }

    /// Publishes `notification.sent` with the sender's profile attached when
    /// the directory answers in time.
    async fn announce(&self, notification: &Notification) {
        let sender = notification.sender;
        let profile = match tokio::time::timeout(self.deadline.0, self.user_directory.lookup(sender)).await {
            Ok(Ok(profile)) => profile,
            Ok(Err(e)) => {
                tracing::warn!(%sender, error = %e, "sender lookup failed");
                None
            }
            Err(_) => {
                tracing::warn!(%sender, "sender lookup timed out");
                None
            }
        };

        self.event_gateway.emit(
            Channel::NotificationSent,
            vec![notification.receiver],
            &NotificationSent {
                notification: notification.clone(),
                sender: SenderView {
                    user_id: sender,
                    profile,
                },
            },
        );
    }

    async fn create(&self, notification: Notification) -> Result<NotificationClaim, RelationError> {
        let claim = self
            .deadline
            .run(self.notification_repo.insert(&notification))
            .await?;
        if let NotificationClaim::Created(stored) = &claim {
            self.announce(stored).await;
        }
        Ok(claim)
    }

    /// Loads a friend request, tombstoned or not.
    async fn load_request(
        &self,
        notification_id: NotificationId,
    ) -> Result<Notification, RelationError> {
        let request = self
            .deadline
            .run(self.notification_repo.get(notification_id))
            .await?
            .ok_or_else(|| RelationError::NotFound(format!("notification {notification_id}")))?;

        if request.kind != NotificationKind::FriendRequest {
            return Err(RelationError::InvalidArgument(format!(
                "notification {notification_id} is a {}, not a friend request",
                request.kind
            )));
        }
        Ok(request)
    }

    /// Loads a notification owned by `receiver`. Someone else's notification
    /// reads as absent.
    async fn load_owned(
        &self,
        notification_id: NotificationId,
        receiver: UserId,
    ) -> Result<Notification, RelationError> {
        self.deadline
            .run(self.notification_repo.get(notification_id))
            .await?
            .filter(|n| n.receiver == receiver)
            .ok_or_else(|| RelationError::NotFound(format!("notification {notification_id}")))
    }

    fn state_changed(
        &self,
        channel: Channel,
        receiver: UserId,
        notification_id: Option<NotificationId>,
        affected: u64,
    ) {
        self.event_gateway.emit(
            channel,
            vec![receiver],
            &NotificationStateChanged {
                receiver,
                notification_id,
                affected,
            },
        );
    }
}

#[async_trait::async_trait]
impl NotificationService for RealNotificationService {
    async fn send_friend_request(
        &self,
        sender: UserId,
        receiver: UserId,
    ) -> Result<Notification, RelationError> {
        if sender == receiver {
            return Err(RelationError::InvalidArgument(
                "cannot send a friend request to self".to_string(),
            ));
        }
        if self.friendship_service.are_friends(sender, receiver).await? {
            return Err(RelationError::Conflict(format!(
                "{sender} and {receiver} are already friends"
            )));
        }

        let request = Notification::new(
            sender,
            receiver,
            NotificationKind::FriendRequest,
            NotificationExtra::default(),
        );
        match self.create(request).await? {
            NotificationClaim::Created(request) => {
                tracing::info!(
                    "friend request {} sent: {} -> {}",
                    request.notification_id,
                    sender,
                    receiver
                );
                Ok(request)
            }
            NotificationClaim::Existing(pending) => Err(RelationError::Conflict(format!(
                "friend request {} is already pending",
                pending.notification_id
            ))),
        }
    }

    async fn accept_friend_request(
        &self,
        notification_id: NotificationId,
        acting_user: UserId,
    ) -> Result<Conversation, RelationError> {
        let request = self.load_request(notification_id).await?;
        if acting_user != request.receiver {
            return Err(RelationError::Forbidden(format!(
                "only the receiver may accept friend request {notification_id}"
            )));
        }
        let (sender, receiver) = (request.sender, request.receiver);

        if request.is_deleted {
            // retried accept: succeed only if an earlier accept went through
            if !self.friendship_service.are_friends(sender, receiver).await? {
                return Err(RelationError::NotFound(format!(
                    "friend request {notification_id} is no longer pending"
                )));
            }
            let (conversation, _) = self
                .membership_service
                .find_or_create_private_conversation(sender, receiver)
                .await?;
            tracing::debug!(%notification_id, "accept replayed");
            return Ok(conversation);
        }

        match self.friendship_service.add_friend(sender, receiver).await {
            Ok(_) => {}
            Err(e) if e.is_conflict() => {
                tracing::debug!(%notification_id, "pair already friends, continuing accept");
            }
            Err(e) => return Err(e),
        }

        self.create(Notification::new(
            receiver,
            sender,
            NotificationKind::FriendAccept,
            NotificationExtra::reply_to(notification_id),
        ))
        .await?;

        let (conversation, _) = self
            .membership_service
            .find_or_create_private_conversation(sender, receiver)
            .await?;

        self.deadline
            .run(self.notification_repo.tombstone(notification_id, Utc::now()))
            .await?;

        tracing::info!(
            "friend request {} accepted, conversation {}",
            notification_id,
            conversation.conversation_id
        );
        Ok(conversation)
    }

    async fn decline_friend_request(
        &self,
        notification_id: NotificationId,
        acting_user: UserId,
    ) -> Result<(), RelationError> {
        let request = self.load_request(notification_id).await?;
        if acting_user != request.receiver {
            return Err(RelationError::Forbidden(format!(
                "only the receiver may decline friend request {notification_id}"
            )));
        }
        let (sender, receiver) = (request.sender, request.receiver);

        if request.is_deleted {
            if self.friendship_service.are_friends(sender, receiver).await? {
                return Err(RelationError::Conflict(format!(
                    "friend request {notification_id} was already accepted"
                )));
            }
            return Ok(());
        }

        self.create(Notification::new(
            receiver,
            sender,
            NotificationKind::FriendReject,
            NotificationExtra::reply_to(notification_id),
        ))
        .await?;

        self.deadline
            .run(self.notification_repo.tombstone(notification_id, Utc::now()))
            .await?;

        tracing::info!("friend request {} declined", notification_id);
        Ok(())
    }

    async fn withdraw_friend_request(
        &self,
        notification_id: NotificationId,
        acting_user: UserId,
    ) -> Result<(), RelationError> {
        let request = self.load_request(notification_id).await?;
        if acting_user != request.sender {
            return Err(RelationError::Forbidden(format!(
                "only the sender may withdraw friend request {notification_id}"
            )));
        }

        if request.is_deleted {
            if self
                .friendship_service
                .are_friends(request.sender, request.receiver)
                .await?
            {
                return Err(RelationError::Conflict(format!(
                    "friend request {notification_id} was already accepted"
                )));
            }
            return Ok(());
        }

        let change = self
            .deadline
            .run(self.notification_repo.tombstone(notification_id, Utc::now()))
            .await?;

        if change.is_some_and(|c| c.changed) {
            tracing::info!("friend request {} withdrawn", notification_id);
            self.state_changed(
                Channel::NotificationWithdrawn,
                request.receiver,
                Some(notification_id),
                1,
            );
        }
        Ok(())
    }

    async fn notify(
        &self,
        sender: UserId,
        receiver: UserId,
        kind: NotificationKind,
        extra: NotificationExtra,
    ) -> Result<Option<Notification>, RelationError> {
        if kind.is_friend_lifecycle() {
            return Err(RelationError::InvalidArgument(format!(
                "{kind} notifications are created by the friend request operations"
            )));
        }
        extra.validate_for(kind).map_err(RelationError::InvalidArgument)?;

        if sender == receiver {
            tracing::debug!(%sender, %kind, "self action, notification suppressed");
            return Ok(None);
        }

        let notification = Notification::new(sender, receiver, kind, extra);
        if let Some(key) = notification.dedup_key() {
            let existing = self
                .deadline
                .run(self.notification_repo.find_active(&key))
                .await?;
            if existing.is_some() {
                return Ok(existing);
            }
        }

        let claim = self.create(notification).await?;
        Ok(Some(claim.into_notification()))
    }

    async fn mark_read(
        &self,
        notification_id: NotificationId,
        receiver: UserId,
    ) -> Result<Notification, RelationError> {
        self.load_owned(notification_id, receiver).await?;
        let change = self
            .deadline
            .run(self.notification_repo.mark_read(notification_id))
            .await?
            .ok_or_else(|| RelationError::NotFound(format!("notification {notification_id}")))?;

        if change.changed {
            self.state_changed(
                Channel::NotificationRead,
                receiver,
                Some(notification_id),
                1,
            );
        }
        Ok(change.notification)
    }

    async fn mark_all_read(&self, receiver: UserId) -> Result<u64, RelationError> {
        let affected = self
            .deadline
            .run(self.notification_repo.mark_all_read(receiver))
            .await?;
        if affected > 0 {
            self.state_changed(Channel::NotificationRead, receiver, None, affected);
        }
        Ok(affected)
    }

    async fn soft_delete(
        &self,
        notification_id: NotificationId,
        receiver: UserId,
    ) -> Result<(), RelationError> {
        let notification = self.load_owned(notification_id, receiver).await?;
        if notification.is_deleted {
            return Ok(());
        }

        let change = self
            .deadline
            .run(self.notification_repo.tombstone(notification_id, Utc::now()))
            .await?;
        if change.is_some_and(|c| c.changed) {
            self.state_changed(
                Channel::NotificationDeleted,
                receiver,
                Some(notification_id),
                1,
            );
        }
        Ok(())
    }

    async fn soft_delete_all(&self, receiver: UserId) -> Result<u64, RelationError> {
        let affected = self
            .deadline
            .run(self.notification_repo.tombstone_all(receiver, Utc::now()))
            .await?;
        if affected > 0 {
            self.state_changed(Channel::NotificationDeleted, receiver, None, affected);
        }
        Ok(affected)
    }

    async fn list_notifications(
        &self,
        receiver: UserId,
        page_size: PageSize,
        before: Option<NotificationCursor>,
    ) -> Result<Vec<Notification>, RelationError> {
        self.deadline
            .run(
                self.notification_repo
                    .list_active(receiver, page_size.clamped(), before),
            )
            .await
    }

    async fn count_unread(&self, receiver: UserId) -> Result<u64, RelationError> {
        self.deadline
            .run(self.notification_repo.count_unread(receiver))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{
        RealFriendshipService, RealMembershipService, RecordingEventGateway,
    };
    use crate::infra_memory::*;

    struct Harness {
        notifications: Arc<RealNotificationService>,
        friendships: Arc<RealFriendshipService>,
        memberships: Arc<RealMembershipService>,
        directory: Arc<MemoryUserDirectory>,
        events: Arc<RecordingEventGateway>,
    }

    fn harness() -> Harness {
        let events = Arc::new(RecordingEventGateway::new());
        let deadline = StoreDeadline::default();
        let friendships = Arc::new(RealFriendshipService::new(
            Arc::new(MemoryFriendshipRepo::new()),
            events.clone(),
            deadline,
        ));
        let memberships = Arc::new(RealMembershipService::new(
            Arc::new(MemoryMembershipRepo::new()),
            Arc::new(MemoryConversationRepo::new()),
            events.clone(),
            deadline,
        ));
        let directory = Arc::new(MemoryUserDirectory::new());
        let notifications = Arc::new(RealNotificationService::new(
            Arc::new(MemoryNotificationRepo::new()),
            friendships.clone(),
            memberships.clone(),
            directory.clone(),
            events.clone(),
            deadline,
        ));
        Harness {
            notifications,
            friendships,
            memberships,
            directory,
            events,
        }
    }

    fn user() -> UserId {
        UserId(uuid::Uuid::new_v4())
    }

    #[tokio::test]
    async fn accept_connects_the_pair_and_opens_a_private_conversation() {
        let h = harness();
        let (a, b) = (user(), user());

        let request = h.notifications.send_friend_request(a, b).await.unwrap();
        let conversation = h
            .notifications
            .accept_friend_request(request.notification_id, b)
            .await
            .unwrap();

        assert!(h.friendships.are_friends(a, b).await.unwrap());
        assert_eq!(conversation.kind, ConversationKind::Private);

        let members = h.memberships.list_members(conversation.conversation_id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().any(|m| m.user_id == a && m.role == MemberRole::Admin));
        assert!(members.iter().any(|m| m.user_id == b && m.role == MemberRole::Member));

        let inbox_a = h.notifications.list_notifications(a, PageSize::default(), None).await.unwrap();
        assert_eq!(inbox_a.len(), 1);
        assert_eq!(inbox_a[0].kind, NotificationKind::FriendAccept);
        assert_eq!(inbox_a[0].sender, b);

        let inbox_b = h.notifications.list_notifications(b, PageSize::default(), None).await.unwrap();
        assert!(inbox_b.is_empty(), "request must be tombstoned");

        assert_eq!(h.events.on(Channel::FriendshipCreated).len(), 1);
        assert_eq!(h.events.on(Channel::ConversationCreated).len(), 1);
        assert_eq!(h.events.on(Channel::NotificationSent).len(), 2);
    }

    #[tokio::test]
    async fn second_accept_returns_the_same_conversation_without_new_notifications() {
        let h = harness();
        let (a, b) = (user(), user());
        let request = h.notifications.send_friend_request(a, b).await.unwrap();

        let first = h
            .notifications
            .accept_friend_request(request.notification_id, b)
            .await
            .unwrap();
        let sent_before = h.events.on(Channel::NotificationSent).len();
        let second = h
            .notifications
            .accept_friend_request(request.notification_id, b)
            .await
            .unwrap();

        assert_eq!(first.conversation_id, second.conversation_id);
        assert_eq!(h.events.on(Channel::NotificationSent).len(), sent_before);
        assert_eq!(h.notifications.count_unread(a).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn accept_after_decline_is_not_found() {
        let h = harness();
        let (a, b) = (user(), user());
        let request = h.notifications.send_friend_request(a, b).await.unwrap();

        h.notifications
            .decline_friend_request(request.notification_id, b)
            .await
            .unwrap();
        h.notifications
            .decline_friend_request(request.notification_id, b)
            .await
            .unwrap();

        let err = h
            .notifications
            .accept_friend_request(request.notification_id, b)
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::NotFound(_)));
        assert!(!h.friendships.are_friends(a, b).await.unwrap());

        let inbox_a = h.notifications.list_notifications(a, PageSize::default(), None).await.unwrap();
        assert_eq!(inbox_a.len(), 1);
        assert_eq!(inbox_a[0].kind, NotificationKind::FriendReject);
    }

    fn sent_of_kind(h: &Harness, kind: NotificationKind) -> usize {
        h.events
            .on(Channel::NotificationSent)
            .iter()
            .filter(|e| e.payload["notification"]["kind"] == kind.as_str())
            .count()
    }

    #[tokio::test]
    async fn every_declined_request_notifies_the_sender() {
        let h = harness();
        let (a, b) = (user(), user());

        for round in 1..=2 {
            let request = h.notifications.send_friend_request(a, b).await.unwrap();
            h.notifications
                .decline_friend_request(request.notification_id, b)
                .await
                .unwrap();
            assert_eq!(sent_of_kind(&h, NotificationKind::FriendReject), round);
        }

        let inbox_a = h.notifications.list_notifications(a, PageSize::default(), None).await.unwrap();
        assert_eq!(inbox_a.len(), 2);
        assert!(inbox_a.iter().all(|n| n.kind == NotificationKind::FriendReject));
    }

    #[tokio::test]
    async fn refriending_after_unfriend_notifies_the_sender_again() {
        let h = harness();
        let (a, b) = (user(), user());

        let first = h.notifications.send_friend_request(a, b).await.unwrap();
        let conversation = h
            .notifications
            .accept_friend_request(first.notification_id, b)
            .await
            .unwrap();
        assert!(h.friendships.remove_friend(a, b).await.unwrap());
        h.events.clear();

        let second = h.notifications.send_friend_request(a, b).await.unwrap();
        let reopened = h
            .notifications
            .accept_friend_request(second.notification_id, b)
            .await
            .unwrap();

        assert_eq!(reopened.conversation_id, conversation.conversation_id);
        assert!(h.friendships.are_friends(a, b).await.unwrap());
        assert_eq!(sent_of_kind(&h, NotificationKind::FriendAccept), 1);
        assert_eq!(h.events.on(Channel::FriendshipCreated).len(), 1);
        assert_eq!(h.notifications.count_unread(a).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lifecycle_checks_guard_the_actors() {
        let h = harness();
        let (a, b, c) = (user(), user(), user());

        let err = h.notifications.send_friend_request(a, a).await.unwrap_err();
        assert!(matches!(err, RelationError::InvalidArgument(_)));

        let request = h.notifications.send_friend_request(a, b).await.unwrap();
        let dup = h.notifications.send_friend_request(a, b).await.unwrap_err();
        assert!(dup.is_conflict());

        let err = h
            .notifications
            .accept_friend_request(request.notification_id, a)
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::Forbidden(_)));
        let err = h
            .notifications
            .decline_friend_request(request.notification_id, c)
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::Forbidden(_)));
        let err = h
            .notifications
            .withdraw_friend_request(request.notification_id, b)
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::Forbidden(_)));

        let missing = NotificationId(uuid::Uuid::new_v4());
        let err = h.notifications.accept_friend_request(missing, b).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFound(_)));

        let like = h
            .notifications
            .notify_follow_user(c, b)
            .await
            .unwrap()
            .unwrap();
        let err = h
            .notifications
            .accept_friend_request(like.notification_id, b)
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn request_to_an_existing_friend_conflicts() {
        let h = harness();
        let (a, b) = (user(), user());
        h.friendships.add_friend(a, b).await.unwrap();

        let err = h.notifications.send_friend_request(b, a).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn withdraw_tombstones_and_tells_the_receiver() {
        let h = harness();
        let (a, b) = (user(), user());
        let request = h.notifications.send_friend_request(a, b).await.unwrap();

        h.notifications
            .withdraw_friend_request(request.notification_id, a)
            .await
            .unwrap();
        h.notifications
            .withdraw_friend_request(request.notification_id, a)
            .await
            .unwrap();

        assert_eq!(h.notifications.count_unread(b).await.unwrap(), 0);
        let withdrawn = h.events.on(Channel::NotificationWithdrawn);
        assert_eq!(withdrawn.len(), 1);
        assert_eq!(withdrawn[0].receivers, vec![b]);

        // a withdrawn request no longer blocks a new one
        h.notifications.send_friend_request(a, b).await.unwrap();
    }

    #[tokio::test]
    async fn self_actions_are_suppressed() {
        let h = harness();
        let a = user();
        let post = PostId(uuid::Uuid::new_v4());

        assert!(h.notifications.notify_like_post(a, a, post).await.unwrap().is_none());
        assert!(h.notifications.notify_follow_user(a, a).await.unwrap().is_none());
        assert_eq!(h.notifications.count_unread(a).await.unwrap(), 0);
        assert!(h.events.events().is_empty());
    }

    #[tokio::test]
    async fn repeated_likes_resolve_to_the_stored_notification() {
        let h = harness();
        let (a, b) = (user(), user());
        let post = PostId(uuid::Uuid::new_v4());
        let other_post = PostId(uuid::Uuid::new_v4());

        let first = h.notifications.notify_like_post(a, b, post).await.unwrap().unwrap();
        let again = h.notifications.notify_like_post(a, b, post).await.unwrap().unwrap();
        let elsewhere = h
            .notifications
            .notify_like_post(a, b, other_post)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.notification_id, again.notification_id);
        assert_ne!(first.notification_id, elsewhere.notification_id);
        assert_eq!(h.events.on(Channel::NotificationSent).len(), 2);

        // comments are not deduplicated
        let comment = CommentId(uuid::Uuid::new_v4());
        h.notifications.notify_comment_post(a, b, post, comment).await.unwrap();
        h.notifications.notify_comment_post(a, b, post, comment).await.unwrap();
        assert_eq!(h.notifications.count_unread(b).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn notify_rejects_lifecycle_kinds_and_mismatched_extra() {
        let h = harness();
        let (a, b) = (user(), user());

        let err = h
            .notifications
            .notify(a, b, NotificationKind::FriendRequest, NotificationExtra::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::InvalidArgument(_)));

        let err = h
            .notifications
            .notify(a, b, NotificationKind::LikePost, NotificationExtra::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn read_and_delete_are_scoped_to_the_receiver() {
        let h = harness();
        let (a, b) = (user(), user());
        let n = h.notifications.notify_follow_user(a, b).await.unwrap().unwrap();

        let err = h.notifications.mark_read(n.notification_id, a).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFound(_)));
        let err = h.notifications.soft_delete(n.notification_id, a).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFound(_)));

        let read = h.notifications.mark_read(n.notification_id, b).await.unwrap();
        assert!(read.is_read);
        h.notifications.mark_read(n.notification_id, b).await.unwrap();
        assert_eq!(h.events.on(Channel::NotificationRead).len(), 1);

        h.notifications.soft_delete(n.notification_id, b).await.unwrap();
        h.notifications.soft_delete(n.notification_id, b).await.unwrap();
        assert_eq!(h.events.on(Channel::NotificationDeleted).len(), 1);
        assert!(h.notifications.list_notifications(b, PageSize::default(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_read_and_delete_report_affected_rows() {
        let h = harness();
        let (a, b, c) = (user(), user(), user());
        h.notifications.notify_follow_user(a, c).await.unwrap();
        h.notifications.notify_follow_user(b, c).await.unwrap();
        h.notifications
            .notify_message(a, c, MessageId(uuid::Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(h.notifications.mark_all_read(c).await.unwrap(), 3);
        assert_eq!(h.notifications.mark_all_read(c).await.unwrap(), 0);
        assert_eq!(h.notifications.count_unread(c).await.unwrap(), 0);
        assert_eq!(h.notifications.soft_delete_all(c).await.unwrap(), 3);
        assert_eq!(h.notifications.soft_delete_all(c).await.unwrap(), 0);

        let read = h.events.on(Channel::NotificationRead);
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].payload["affected"], 3);
        assert_eq!(h.events.on(Channel::NotificationDeleted).len(), 1);
    }

    #[tokio::test]
    async fn sent_event_carries_the_sender_profile_when_known() {
        let h = harness();
        let (a, b) = (user(), user());
        h.directory.register(UserProfile {
            user_id: a,
            username: "ada".to_string(),
            avatar_url: None,
        });

        h.notifications.notify_follow_user(a, b).await.unwrap();
        h.notifications.notify_follow_user(b, a).await.unwrap();

        let sent = h.events.on(Channel::NotificationSent);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].receivers, vec![b]);
        assert_eq!(sent[0].payload["sender"]["profile"]["username"], "ada");
        assert!(sent[1].payload["sender"]["profile"].is_null());
    }
}
