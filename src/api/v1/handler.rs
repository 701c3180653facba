use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

fn reply<T: Serialize>(data: T) -> warp::reply::Json {
    warp::reply::json(&ApiResponse::ok(data))
}

#[derive(Debug, Serialize)]
pub struct Affected {
    pub affected: u64,
}

#[derive(Debug, Serialize)]
pub struct Removed {
    pub removed: bool,
}

// region friends

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub receiver: UserId,
}

pub async fn send_friend_request(
    acting_user: UserId,
    body: FriendRequestBody,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = notification_service
        .send_friend_request(acting_user, body.receiver)
        .await
        .map_err(rejection)?;
    Ok(reply(request))
}

pub async fn accept_friend_request(
    notification_id: NotificationId,
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let conversation = notification_service
        .accept_friend_request(notification_id, acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(conversation))
}

pub async fn decline_friend_request(
    notification_id: NotificationId,
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    notification_service
        .decline_friend_request(notification_id, acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(()))
}

pub async fn withdraw_friend_request(
    notification_id: NotificationId,
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    notification_service
        .withdraw_friend_request(notification_id, acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(()))
}

pub async fn list_friends(
    acting_user: UserId,
    friendship_service: Arc<dyn FriendshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ids = friendship_service
        .list_friend_ids(acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(ids))
}

pub async fn common_friends(
    other: UserId,
    acting_user: UserId,
    friendship_service: Arc<dyn FriendshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ids = friendship_service
        .common_friends(acting_user, other)
        .await
        .map_err(rejection)?;
    Ok(reply(ids))
}

pub async fn remove_friend(
    other: UserId,
    acting_user: UserId,
    friendship_service: Arc<dyn FriendshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let removed = friendship_service
        .remove_friend(acting_user, other)
        .await
        .map_err(rejection)?;
    Ok(reply(Removed { removed }))
}

// endregion

// region notifications

#[derive(Debug, Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub page_size: PageSize,
    pub before: Option<String>,
}

pub async fn list_notifications(
    query: NotificationListQuery,
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let before = query
        .before
        .as_deref()
        .map(str::parse::<NotificationCursor>)
        .transpose()
        .map_err(|e| reject::custom(ApiFailure::new(ApiErrorCode::InvalidArgument, e)))?;

    let page = notification_service
        .list_notifications(acting_user, query.page_size, before)
        .await
        .map_err(rejection)?;
    Ok(reply(page))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: u64,
}

pub async fn count_unread(
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let unread = notification_service
        .count_unread(acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(UnreadCount { unread }))
}

#[derive(Debug, Deserialize)]
pub struct NotifyBody {
    pub receiver: UserId,
    pub kind: NotificationKind,
    #[serde(default)]
    pub extra: NotificationExtra,
}

/// Acting user is the sender. Responds with `null` data for a suppressed
/// self-action.
pub async fn notify(
    acting_user: UserId,
    body: NotifyBody,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let notification = notification_service
        .notify(acting_user, body.receiver, body.kind, body.extra)
        .await
        .map_err(rejection)?;
    Ok(reply(notification))
}

pub async fn mark_read(
    notification_id: NotificationId,
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let notification = notification_service
        .mark_read(notification_id, acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(notification))
}

pub async fn mark_all_read(
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let affected = notification_service
        .mark_all_read(acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(Affected { affected }))
}

pub async fn soft_delete(
    notification_id: NotificationId,
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    notification_service
        .soft_delete(notification_id, acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(()))
}

pub async fn soft_delete_all(
    acting_user: UserId,
    notification_service: Arc<dyn NotificationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let affected = notification_service
        .soft_delete_all(acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(Affected { affected }))
}

// endregion

// region conversations

#[derive(Debug, Deserialize)]
pub struct PrivateConversationBody {
    pub peer: UserId,
}

#[derive(Debug, Serialize)]
pub struct PrivateConversationResponse {
    pub conversation: Conversation,
    pub created: bool,
}

pub async fn open_private_conversation(
    acting_user: UserId,
    body: PrivateConversationBody,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let (conversation, created) = membership_service
        .find_or_create_private_conversation(acting_user, body.peer)
        .await
        .map_err(rejection)?;
    Ok(reply(PrivateConversationResponse {
        conversation,
        created,
    }))
}

#[derive(Debug, Deserialize)]
pub struct GroupConversationBody {
    pub members: Vec<UserId>,
}

pub async fn create_group_conversation(
    acting_user: UserId,
    body: GroupConversationBody,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let conversation = membership_service
        .create_group_conversation(acting_user, &body.members)
        .await
        .map_err(rejection)?;
    Ok(reply(conversation))
}

pub async fn list_conversations(
    acting_user: UserId,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ids = membership_service
        .list_conversations_for_user(acting_user)
        .await
        .map_err(rejection)?;
    Ok(reply(ids))
}

/// Member listing and changes are limited to participants; role changes and
/// removing someone else need the admin role.
async fn require_role(
    membership_service: &Arc<dyn MembershipService>,
    conversation_id: ConversationId,
    acting_user: UserId,
    admin: bool,
) -> Result<(), warp::Rejection> {
    let members = membership_service
        .list_members(conversation_id)
        .await
        .map_err(rejection)?;
    let allowed = members.iter().any(|m| {
        m.user_id == acting_user && (!admin || m.role == MemberRole::Admin)
    });
    if allowed {
        Ok(())
    } else {
        Err(rejection(RelationError::Forbidden(format!(
            "user {acting_user} may not manage conversation {conversation_id}"
        ))))
    }
}

pub async fn list_members(
    conversation_id: ConversationId,
    acting_user: UserId,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    require_role(&membership_service, conversation_id, acting_user, false).await?;
    let members = membership_service
        .list_members(conversation_id)
        .await
        .map_err(rejection)?;
    Ok(reply(members))
}

#[derive(Debug, Deserialize)]
pub struct AddMembersBody {
    pub user_ids: Vec<UserId>,
    #[serde(default = "default_role")]
    pub role: MemberRole,
}

fn default_role() -> MemberRole {
    MemberRole::Member
}

pub async fn add_members(
    conversation_id: ConversationId,
    acting_user: UserId,
    body: AddMembersBody,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    require_role(&membership_service, conversation_id, acting_user, false).await?;
    let members = membership_service
        .add_members(conversation_id, &body.user_ids, body.role)
        .await
        .map_err(rejection)?;
    Ok(reply(members))
}

pub async fn remove_member(
    conversation_id: ConversationId,
    user_id: UserId,
    acting_user: UserId,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if user_id != acting_user {
        require_role(&membership_service, conversation_id, acting_user, true).await?;
    }
    let removed = membership_service
        .remove_member(conversation_id, user_id)
        .await
        .map_err(rejection)?;
    Ok(reply(Removed { removed }))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleBody {
    pub role: MemberRole,
}

pub async fn set_role(
    conversation_id: ConversationId,
    user_id: UserId,
    acting_user: UserId,
    body: SetRoleBody,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    require_role(&membership_service, conversation_id, acting_user, true).await?;
    let member = membership_service
        .set_role(conversation_id, user_id, body.role)
        .await
        .map_err(rejection)?;
    Ok(reply(member))
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub message_id: MessageId,
}

pub async fn pin_message(
    conversation_id: ConversationId,
    acting_user: UserId,
    body: MessageBody,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let conversation = membership_service
        .pin_message(conversation_id, acting_user, body.message_id)
        .await
        .map_err(rejection)?;
    Ok(reply(conversation))
}

pub async fn unpin_message(
    conversation_id: ConversationId,
    message_id: MessageId,
    acting_user: UserId,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let conversation = membership_service
        .unpin_message(conversation_id, acting_user, message_id)
        .await
        .map_err(rejection)?;
    Ok(reply(conversation))
}

pub async fn record_message(
    conversation_id: ConversationId,
    acting_user: UserId,
    body: MessageBody,
    membership_service: Arc<dyn MembershipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    membership_service
        .record_message_created(conversation_id, acting_user, body.message_id)
        .await
        .map_err(rejection)?;
    Ok(reply(()))
}

// endregion
