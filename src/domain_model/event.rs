use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel taxonomy understood by the real-time delivery service. Names are
/// part of the wire contract and must not change with the transport.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "notification.sent")]
    NotificationSent,
    #[serde(rename = "notification.read")]
    NotificationRead,
    #[serde(rename = "notification.deleted")]
    NotificationDeleted,
    #[serde(rename = "notification.withdrawn")]
    NotificationWithdrawn,
    #[serde(rename = "friendship.created")]
    FriendshipCreated,
    #[serde(rename = "friendship.removed")]
    FriendshipRemoved,
    #[serde(rename = "conversation.created")]
    ConversationCreated,
    #[serde(rename = "conversation.member.added")]
    ConversationMemberAdded,
    #[serde(rename = "conversation.member.removed")]
    ConversationMemberRemoved,
    #[serde(rename = "conversation.member.role_changed")]
    ConversationMemberRoleChanged,
    #[serde(rename = "message.created")]
    MessageCreated,
    #[serde(rename = "message.pinned")]
    MessagePinned,
    #[serde(rename = "message.unpinned")]
    MessageUnpinned,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::NotificationSent => "notification.sent",
            Channel::NotificationRead => "notification.read",
            Channel::NotificationDeleted => "notification.deleted",
            Channel::NotificationWithdrawn => "notification.withdrawn",
            Channel::FriendshipCreated => "friendship.created",
            Channel::FriendshipRemoved => "friendship.removed",
            Channel::ConversationCreated => "conversation.created",
            Channel::ConversationMemberAdded => "conversation.member.added",
            Channel::ConversationMemberRemoved => "conversation.member.removed",
            Channel::ConversationMemberRoleChanged => "conversation.member.role_changed",
            Channel::MessageCreated => "message.created",
            Channel::MessagePinned => "message.pinned",
            Channel::MessageUnpinned => "message.unpinned",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral message handed to the event gateway. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub channel: String,
    pub receivers: Vec<UserId>,
    pub payload: serde_json::Value,
}

impl DomainEvent {
    pub fn new<T: Serialize>(
        channel: Channel,
        receivers: Vec<UserId>,
        payload: &T,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            channel: channel.as_str().to_owned(),
            receivers,
            payload: serde_json::to_value(payload)?,
        })
    }
}

// region payloads

#[derive(Debug, Serialize, Deserialize)]
pub struct SenderView {
    pub user_id: UserId,
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
pub struct NotificationSent {
    pub notification: Notification,
    pub sender: SenderView,
}

/// `notification_id == None` means every notification of the receiver.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationStateChanged {
    pub receiver: UserId,
    pub notification_id: Option<NotificationId>,
    pub affected: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendshipChanged {
    pub user_low: UserId,
    pub user_high: UserId,
}

#[derive(Debug, Serialize)]
pub struct ConversationCreated {
    pub conversation: Conversation,
    pub members: Vec<ConversationMember>,
}

#[derive(Debug, Serialize)]
pub struct MemberChanged {
    pub member: ConversationMember,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberRemoved {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagePinChanged {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub by: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageCreated {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub sender: UserId,
}

// endregion
