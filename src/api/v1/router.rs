use super::error::*;
use super::handler;
use crate::domain_model::*;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

/// Header set by the authenticating gateway in front of this service.
pub const ACTING_USER_HEADER: &str = "x-user-id";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    friend_routes(server.clone())
        .or(notification_routes(server.clone()))
        .or(conversation_routes(server))
}

fn friend_routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let send_request = warp::post()
        .and(warp::path!("friends" / "requests"))
        .and(acting_user())
        .and(warp::body::json())
        .and(with(server.notification_service.clone()))
        .and_then(handler::send_friend_request);

    let accept = warp::post()
        .and(warp::path!("friends" / "requests" / NotificationId / "accept"))
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::accept_friend_request);

    let decline = warp::post()
        .and(warp::path!("friends" / "requests" / NotificationId / "decline"))
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::decline_friend_request);

    let withdraw = warp::post()
        .and(warp::path!("friends" / "requests" / NotificationId / "withdraw"))
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::withdraw_friend_request);

    let list = warp::get()
        .and(warp::path!("friends"))
        .and(acting_user())
        .and(with(server.friendship_service.clone()))
        .and_then(handler::list_friends);

    let common = warp::get()
        .and(warp::path!("friends" / UserId / "common"))
        .and(acting_user())
        .and(with(server.friendship_service.clone()))
        .and_then(handler::common_friends);

    let remove = warp::delete()
        .and(warp::path!("friends" / UserId))
        .and(acting_user())
        .and(with(server.friendship_service.clone()))
        .and_then(handler::remove_friend);

    send_request
        .or(accept)
        .or(decline)
        .or(withdraw)
        .or(list)
        .or(common)
        .or(remove)
}

fn notification_routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let list = warp::get()
        .and(warp::path!("notifications"))
        .and(warp::query::<handler::NotificationListQuery>())
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::list_notifications);

    let unread = warp::get()
        .and(warp::path!("notifications" / "unread_count"))
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::count_unread);

    let notify = warp::post()
        .and(warp::path!("notifications"))
        .and(acting_user())
        .and(warp::body::json())
        .and(with(server.notification_service.clone()))
        .and_then(handler::notify);

    let read_all = warp::post()
        .and(warp::path!("notifications" / "read_all"))
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::mark_all_read);

    let read = warp::post()
        .and(warp::path!("notifications" / NotificationId / "read"))
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::mark_read);

    let delete_all = warp::delete()
        .and(warp::path!("notifications"))
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::soft_delete_all);

    let delete = warp::delete()
        .and(warp::path!("notifications" / NotificationId))
        .and(acting_user())
        .and(with(server.notification_service.clone()))
        .and_then(handler::soft_delete);

    list.or(unread)
        .or(notify)
        .or(read_all)
        .or(read)
        .or(delete_all)
        .or(delete)
}

fn conversation_routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let open_private = warp::post()
        .and(warp::path!("conversations" / "private"))
        .and(acting_user())
        .and(warp::body::json())
        .and(with(server.membership_service.clone()))
        .and_then(handler::open_private_conversation);

    let create_group = warp::post()
        .and(warp::path!("conversations" / "group"))
        .and(acting_user())
        .and(warp::body::json())
        .and(with(server.membership_service.clone()))
        .and_then(handler::create_group_conversation);

    let list = warp::get()
        .and(warp::path!("conversations"))
        .and(acting_user())
        .and(with(server.membership_service.clone()))
        .and_then(handler::list_conversations);

    let members = warp::get()
        .and(warp::path!("conversations" / ConversationId / "members"))
        .and(acting_user())
        .and(with(server.membership_service.clone()))
        .and_then(handler::list_members);

    let add_members = warp::post()
        .and(warp::path!("conversations" / ConversationId / "members"))
        .and(acting_user())
        .and(warp::body::json())
        .and(with(server.membership_service.clone()))
        .and_then(handler::add_members);

    let remove_member = warp::delete()
        .and(warp::path!("conversations" / ConversationId / "members" / UserId))
        .and(acting_user())
        .and(with(server.membership_service.clone()))
        .and_then(handler::remove_member);

    let set_role = warp::put()
        .and(warp::path!("conversations" / ConversationId / "members" / UserId / "role"))
        .and(acting_user())
        .and(warp::body::json())
        .and(with(server.membership_service.clone()))
        .and_then(handler::set_role);

    let pin = warp::post()
        .and(warp::path!("conversations" / ConversationId / "pins"))
        .and(acting_user())
        .and(warp::body::json())
        .and(with(server.membership_service.clone()))
        .and_then(handler::pin_message);

    let unpin = warp::delete()
        .and(warp::path!("conversations" / ConversationId / "pins" / MessageId))
        .and(acting_user())
        .and(with(server.membership_service.clone()))
        .and_then(handler::unpin_message);

    let message = warp::post()
        .and(warp::path!("conversations" / ConversationId / "messages"))
        .and(acting_user())
        .and(warp::body::json())
        .and(with(server.membership_service.clone()))
        .and_then(handler::record_message);

    open_private
        .or(create_group)
        .or(list)
        .or(members)
        .or(add_members)
        .or(remove_member)
        .or(set_role)
        .or(pin)
        .or(unpin)
        .or(message)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn acting_user() -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(ACTING_USER_HEADER).and_then(
        |value: Option<String>| async move {
            let value = value.ok_or_else(|| {
                reject::custom(ApiFailure::new(
                    ApiErrorCode::Unauthenticated,
                    format!("missing {ACTING_USER_HEADER} header"),
                ))
            })?;
            value.trim().parse::<UserId>().map_err(|e| {
                reject::custom(ApiFailure::new(
                    ApiErrorCode::Unauthenticated,
                    format!("bad {ACTING_USER_HEADER} header: {e}"),
                ))
            })
        },
    )
}
