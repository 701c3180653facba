//! Walks two users through a friend request over the in-memory backend and
//! prints every event the gateway hands to the transport.
//!
//! $ cargo run --bin relationship_demo

use rapport::domain_model::*;
use rapport::logger::*;
use rapport::server::*;
use rapport::settings::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "rapport=debug".to_string(),
    })?;

    let settings = parse_settings_str(
        r#"
        [http]
        cert_path = ""
        key_path = ""
        address = "127.0.0.1:0"

        [log]
        filter = "rapport=debug"

        [store]
        backend = "memory"

        [event]
        backend = "log"
        "#,
    )?;

    let publisher = Arc::new(RecordingPublisher::new());
    let server = Server::in_memory(publisher.clone(), &settings);

    let a = UserId(uuid::Uuid::new_v4());
    let b = UserId(uuid::Uuid::new_v4());
    info!("A = {a}, B = {b}");

    let request = server.notification_service.send_friend_request(a, b).await?;
    let conversation = server
        .notification_service
        .accept_friend_request(request.notification_id, b)
        .await?;
    info!(
        "friends: {}, private conversation: {}",
        server.friendship_service.are_friends(a, b).await?,
        conversation.conversation_id
    );

    let post = PostId(uuid::Uuid::new_v4());
    server.notification_service.notify_like_post(b, a, post).await?;
    server.notification_service.notify_like_post(b, a, post).await?;
    server.notification_service.notify_like_post(a, a, post).await?;
    info!("unread for A: {}", server.notification_service.count_unread(a).await?);

    server.shutdown().await;

    for record in publisher.records() {
        println!(
            "{} {}",
            String::from_utf8_lossy(&record.key),
            String::from_utf8_lossy(&record.payload)
        );
    }

    Ok(())
}
