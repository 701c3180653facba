#![allow(dead_code)]

use rapport::domain_model::*;
use rapport::server::*;
use rapport::settings::*;
use std::sync::Arc;

pub fn settings() -> Settings {
    parse_settings_str(
        r#"
        [http]
        cert_path = ""
        key_path = ""
        address = "127.0.0.1:0"

        [log]
        filter = "info"

        [store]
        backend = "memory"
        deadline_ms = 1000

        [event]
        backend = "log"
        publish_timeout_ms = 500
        "#,
    )
    .expect("test settings parse")
}

pub fn server() -> (Arc<Server>, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::new());
    let server = Arc::new(Server::in_memory(publisher.clone(), &settings()));
    (server, publisher)
}

pub fn user() -> UserId {
    UserId(uuid::Uuid::new_v4())
}

/// Decoded events, in delivery order, for one channel.
pub fn published(publisher: &RecordingPublisher, channel: Channel) -> Vec<DomainEvent> {
    publisher
        .records()
        .into_iter()
        .filter(|r| r.key == channel.as_str().as_bytes())
        .map(|r| serde_json::from_slice(&r.payload).expect("published payload is a DomainEvent"))
        .collect()
}
