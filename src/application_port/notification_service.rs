use crate::application_port::RelationError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    // region friend request lifecycle

    async fn send_friend_request(
        &self,
        sender: UserId,
        receiver: UserId,
    ) -> Result<Notification, RelationError>;
    /// Returns the private conversation of the new friends. Retrying an
    /// accept that already went through returns the same conversation.
    async fn accept_friend_request(
        &self,
        notification_id: NotificationId,
        acting_user: UserId,
    ) -> Result<Conversation, RelationError>;
    async fn decline_friend_request(
        &self,
        notification_id: NotificationId,
        acting_user: UserId,
    ) -> Result<(), RelationError>;
    async fn withdraw_friend_request(
        &self,
        notification_id: NotificationId,
        acting_user: UserId,
    ) -> Result<(), RelationError>;

    // endregion

    /// Creates a notification of a non-lifecycle kind. `None` when the action
    /// targets the actor's own content.
    async fn notify(
        &self,
        sender: UserId,
        receiver: UserId,
        kind: NotificationKind,
        extra: NotificationExtra,
    ) -> Result<Option<Notification>, RelationError>;

    async fn mark_read(
        &self,
        notification_id: NotificationId,
        receiver: UserId,
    ) -> Result<Notification, RelationError>;
    async fn mark_all_read(&self, receiver: UserId) -> Result<u64, RelationError>;
    async fn soft_delete(
        &self,
        notification_id: NotificationId,
        receiver: UserId,
    ) -> Result<(), RelationError>;
    async fn soft_delete_all(&self, receiver: UserId) -> Result<u64, RelationError>;
    async fn list_notifications(
        &self,
        receiver: UserId,
        page_size: PageSize,
        before: Option<NotificationCursor>,
    ) -> Result<Vec<Notification>, RelationError>;
    async fn count_unread(&self, receiver: UserId) -> Result<u64, RelationError>;

    // region typed constructors

    async fn notify_follow_user(
        &self,
        sender: UserId,
        receiver: UserId,
    ) -> Result<Option<Notification>, RelationError> {
        self.notify(
            sender,
            receiver,
            NotificationKind::FollowUser,
            NotificationExtra::default(),
        )
        .await
    }

    async fn notify_like_post(
        &self,
        sender: UserId,
        receiver: UserId,
        post_id: PostId,
    ) -> Result<Option<Notification>, RelationError> {
        self.notify(
            sender,
            receiver,
            NotificationKind::LikePost,
            NotificationExtra::post(post_id),
        )
        .await
    }

    async fn notify_comment_post(
        &self,
        sender: UserId,
        receiver: UserId,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Result<Option<Notification>, RelationError> {
        self.notify(
            sender,
            receiver,
            NotificationKind::CommentPost,
            NotificationExtra::comment(post_id, comment_id),
        )
        .await
    }

    async fn notify_like_comment(
        &self,
        sender: UserId,
        receiver: UserId,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Result<Option<Notification>, RelationError> {
        self.notify(
            sender,
            receiver,
            NotificationKind::LikeComment,
            NotificationExtra::comment(post_id, comment_id),
        )
        .await
    }

    async fn notify_reply_comment(
        &self,
        sender: UserId,
        receiver: UserId,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Result<Option<Notification>, RelationError> {
        self.notify(
            sender,
            receiver,
            NotificationKind::ReplyComment,
            NotificationExtra::comment(post_id, comment_id),
        )
        .await
    }

    async fn notify_create_post(
        &self,
        sender: UserId,
        receiver: UserId,
        post_id: PostId,
    ) -> Result<Option<Notification>, RelationError> {
        self.notify(
            sender,
            receiver,
            NotificationKind::CreatePost,
            NotificationExtra::post(post_id),
        )
        .await
    }

    async fn notify_message(
        &self,
        sender: UserId,
        receiver: UserId,
        message_id: MessageId,
    ) -> Result<Option<Notification>, RelationError> {
        self.notify(
            sender,
            receiver,
            NotificationKind::Message,
            NotificationExtra::message(message_id),
        )
        .await
    }

    // endregion
}
