use crate::domain_model::{MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct NotificationId(pub uuid::Uuid);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(NotificationId)
    }
}

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct PostId(pub uuid::Uuid);

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct CommentId(pub uuid::Uuid);

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct GroupId(pub uuid::Uuid);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    FriendRequest,
    FriendAccept,
    FriendReject,
    Message,
    FollowUser,
    LikePost,
    CommentPost,
    LikeComment,
    ReplyComment,
    CreatePost,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FriendRequest => "friend-request",
            NotificationKind::FriendAccept => "friend-accept",
            NotificationKind::FriendReject => "friend-reject",
            NotificationKind::Message => "message",
            NotificationKind::FollowUser => "follow-user",
            NotificationKind::LikePost => "like-post",
            NotificationKind::CommentPost => "comment-post",
            NotificationKind::LikeComment => "like-comment",
            NotificationKind::ReplyComment => "reply-comment",
            NotificationKind::CreatePost => "create-post",
        }
    }

    /// Kinds driven by the friend-request state machine rather than `notify`.
    pub fn is_friend_lifecycle(&self) -> bool {
        matches!(
            self,
            NotificationKind::FriendRequest
                | NotificationKind::FriendAccept
                | NotificationKind::FriendReject
        )
    }

    /// At most one active notification per `DedupKey` for these kinds.
    /// Repeated likes/follows resolve to the stored row, and the friend
    /// lifecycle relies on it to make every step retryable.
    pub fn is_deduplicated(&self) -> bool {
        matches!(
            self,
            NotificationKind::FriendRequest
                | NotificationKind::FriendAccept
                | NotificationKind::FriendReject
                | NotificationKind::FollowUser
                | NotificationKind::LikePost
                | NotificationKind::LikeComment
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "friend-request" => Ok(NotificationKind::FriendRequest),
            "friend-accept" => Ok(NotificationKind::FriendAccept),
            "friend-reject" => Ok(NotificationKind::FriendReject),
            "message" => Ok(NotificationKind::Message),
            "follow-user" => Ok(NotificationKind::FollowUser),
            "like-post" => Ok(NotificationKind::LikePost),
            "comment-post" => Ok(NotificationKind::CommentPost),
            "like-comment" => Ok(NotificationKind::LikeComment),
            "reply-comment" => Ok(NotificationKind::ReplyComment),
            "create-post" => Ok(NotificationKind::CreatePost),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

/// Ids of the entities a notification points at.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NotificationExtra {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<CommentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    /// The friend request an accept or reject answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<NotificationId>,
}

impl NotificationExtra {
    pub fn post(post_id: PostId) -> Self {
        Self {
            post_id: Some(post_id),
            ..Self::default()
        }
    }

    pub fn comment(post_id: PostId, comment_id: CommentId) -> Self {
        Self {
            post_id: Some(post_id),
            comment_id: Some(comment_id),
            ..Self::default()
        }
    }

    pub fn message(message_id: MessageId) -> Self {
        Self {
            message_id: Some(message_id),
            ..Self::default()
        }
    }

    pub fn reply_to(request_id: NotificationId) -> Self {
        Self {
            request_id: Some(request_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Most specific entity referenced, used as the dedup target. Answers to
    /// a friend request are keyed on the request, so each request gets its
    /// own accept or reject.
    pub fn target(&self) -> Option<uuid::Uuid> {
        self.request_id
            .map(|r| r.0)
            .or(self.comment_id.map(|c| c.0))
            .or(self.post_id.map(|p| p.0))
            .or(self.message_id.map(|m| m.0))
            .or(self.group_id.map(|g| g.0))
    }

    /// Checks that `kind` carries the ids it needs. Accepts and rejects carry
    /// only the answered request; only they may carry one.
    pub fn validate_for(&self, kind: NotificationKind) -> Result<(), String> {
        let ok = match kind {
            NotificationKind::FriendAccept | NotificationKind::FriendReject => {
                self.request_id.is_some_and(|r| *self == Self::reply_to(r))
            }
            _ if self.request_id.is_some() => false,
            NotificationKind::FriendRequest | NotificationKind::FollowUser => self.is_empty(),
            NotificationKind::LikePost
            | NotificationKind::CommentPost
            | NotificationKind::CreatePost => self.post_id.is_some(),
            NotificationKind::LikeComment | NotificationKind::ReplyComment => {
                self.post_id.is_some() && self.comment_id.is_some()
            }
            NotificationKind::Message => self.message_id.is_some(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("extra does not match notification kind {kind}"))
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct DedupKey {
    pub sender: UserId,
    pub receiver: UserId,
    pub kind: NotificationKind,
    pub target: Option<uuid::Uuid>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Notification {
    pub notification_id: NotificationId,
    pub sender: UserId,
    pub receiver: UserId,
    pub kind: NotificationKind,
    pub extra: NotificationExtra,
    pub is_read: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        sender: UserId,
        receiver: UserId,
        kind: NotificationKind,
        extra: NotificationExtra,
    ) -> Self {
        Self {
            notification_id: NotificationId(uuid::Uuid::new_v4()),
            sender,
            receiver,
            kind,
            extra,
            is_read: false,
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn dedup_key(&self) -> Option<DedupKey> {
        if !self.kind.is_deduplicated() {
            return None;
        }
        Some(DedupKey {
            sender: self.sender,
            receiver: self.receiver,
            kind: self.kind,
            target: self.extra.target(),
        })
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    pub fn cursor(&self) -> NotificationCursor {
        NotificationCursor {
            created_at: self.created_at,
            notification_id: self.notification_id,
        }
    }
}

/// Keyset cursor for newest-first listing.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct NotificationCursor {
    pub created_at: DateTime<Utc>,
    pub notification_id: NotificationId, // tiebreaker
}

impl fmt::Display for NotificationCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}~{}",
            self.created_at.to_rfc3339(),
            self.notification_id
        )
    }
}

impl FromStr for NotificationCursor {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date_str, id_str) = s.split_once('~').ok_or("invalid cursor format")?;

        let created_at = date_str
            .parse::<DateTime<Utc>>()
            .map_err(|e| e.to_string())?;

        let notification_id = uuid::Uuid::parse_str(id_str)
            .map(NotificationId)
            .map_err(|e| e.to_string())?;

        Ok(NotificationCursor {
            created_at,
            notification_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip_through_serde_and_from_str() {
        let json = serde_json::to_string(&NotificationKind::LikeComment).unwrap();
        assert_eq!(json, "\"like-comment\"");
        assert_eq!(
            "like-comment".parse::<NotificationKind>().unwrap(),
            NotificationKind::LikeComment
        );
        assert!("poke".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn only_spammable_and_lifecycle_kinds_carry_a_dedup_key() {
        let a = UserId(uuid::Uuid::new_v4());
        let b = UserId(uuid::Uuid::new_v4());
        let post = PostId(uuid::Uuid::new_v4());

        let like = Notification::new(a, b, NotificationKind::LikePost, NotificationExtra::post(post));
        let key = like.dedup_key().unwrap();
        assert_eq!(key.target, Some(post.0));

        let comment = Notification::new(
            a,
            b,
            NotificationKind::CommentPost,
            NotificationExtra::post(post),
        );
        assert!(comment.dedup_key().is_none());
    }

    #[test]
    fn extra_is_validated_per_kind() {
        let post = PostId(uuid::Uuid::new_v4());
        assert!(NotificationExtra::default()
            .validate_for(NotificationKind::FriendRequest)
            .is_ok());
        assert!(NotificationExtra::post(post)
            .validate_for(NotificationKind::FriendRequest)
            .is_err());
        assert!(NotificationExtra::post(post)
            .validate_for(NotificationKind::LikeComment)
            .is_err());
        assert!(NotificationExtra::default()
            .validate_for(NotificationKind::LikePost)
            .is_err());
    }

    #[test]
    fn answers_are_keyed_on_the_request_they_answer() {
        let (a, b) = (UserId(uuid::Uuid::new_v4()), UserId(uuid::Uuid::new_v4()));
        let first = NotificationId(uuid::Uuid::new_v4());
        let second = NotificationId(uuid::Uuid::new_v4());

        let reject = |request| {
            Notification::new(b, a, NotificationKind::FriendReject, NotificationExtra::reply_to(request))
        };
        assert_eq!(reject(first).dedup_key(), reject(first).dedup_key());
        assert_ne!(reject(first).dedup_key(), reject(second).dedup_key());

        assert!(NotificationExtra::reply_to(first)
            .validate_for(NotificationKind::FriendAccept)
            .is_ok());
        assert!(NotificationExtra::default()
            .validate_for(NotificationKind::FriendReject)
            .is_err());
        assert!(NotificationExtra::reply_to(first)
            .validate_for(NotificationKind::FollowUser)
            .is_err());
    }

    #[test]
    fn cursor_parses_its_own_display() {
        let n = Notification::new(
            UserId(uuid::Uuid::new_v4()),
            UserId(uuid::Uuid::new_v4()),
            NotificationKind::FollowUser,
            NotificationExtra::default(),
        );
        let cursor = n.cursor();
        let parsed: NotificationCursor = cursor.to_string().parse().unwrap();
        assert_eq!(parsed.notification_id, n.notification_id);
        assert!("garbage".parse::<NotificationCursor>().is_err());
    }
}
