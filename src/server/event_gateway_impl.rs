use crate::application_port::EventGateway;
use crate::domain_model::DomainEvent;
use crate::server::EventPublisher;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

/// Hands each event to a detached task so the caller never waits on the
/// transport. Every delivery is bounded by `timeout`; failures end in a
/// `warn!` and nothing else.
pub struct DetachedEventGateway {
    publisher: Arc<dyn EventPublisher>,
    topic: Arc<str>,
    timeout: Duration,
    tracker: TaskTracker,
}

impl DetachedEventGateway {
    pub const MAX_PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);

    /// `timeout` is clamped to [`Self::MAX_PUBLISH_TIMEOUT`].
    pub fn new(publisher: Arc<dyn EventPublisher>, topic: &str, timeout: Duration) -> Self {
        Self {
            publisher,
            topic: Arc::from(topic),
            timeout: timeout.min(Self::MAX_PUBLISH_TIMEOUT),
            tracker: TaskTracker::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits for in-flight deliveries. Events published afterwards are still
    /// delivered but no longer awaited.
    pub async fn shutdown(&self) {
        self.tracker.close();
        tracing::info!("waiting for {} in-flight events", self.tracker.len());
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    async fn deliver(
        publisher: Arc<dyn EventPublisher>,
        topic: Arc<str>,
        timeout: Duration,
        event: DomainEvent,
    ) {
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(channel = %event.channel, error = %e, "encode event");
                return;
            }
        };

        let send = publisher.publish(&topic, event.channel.as_bytes(), &payload);
        match tokio::time::timeout(timeout, send).await {
            Ok(Ok(())) => tracing::trace!(channel = %event.channel, "event published"),
            Ok(Err(e)) => {
                tracing::warn!(channel = %event.channel, error = %e, "event dropped, publish failed")
            }
            Err(_) => {
                tracing::warn!(channel = %event.channel, ?timeout, "event dropped, publish timed out")
            }
        }
    }
}

impl EventGateway for DetachedEventGateway {
    fn publish(&self, event: DomainEvent) {
        let publisher = self.publisher.clone();
        let topic = self.topic.clone();
        let timeout = self.timeout;
        self.tracker
            .spawn(Self::deliver(publisher, topic, timeout, event));
    }

    fn publish_batch(&self, events: Vec<DomainEvent>) {
        if events.is_empty() {
            return;
        }
        let publisher = self.publisher.clone();
        let topic = self.topic.clone();
        let timeout = self.timeout;
        self.tracker.spawn(async move {
            join_all(
                events
                    .into_iter()
                    .map(|event| Self::deliver(publisher.clone(), topic.clone(), timeout, event)),
            )
            .await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{Channel, FriendshipChanged, UserId};
    use crate::server::{FailingPublisher, RecordingPublisher};
    use std::time::Instant;

    fn event() -> DomainEvent {
        let (a, b) = (UserId(uuid::Uuid::new_v4()), UserId(uuid::Uuid::new_v4()));
        DomainEvent::new(
            Channel::FriendshipCreated,
            vec![a, b],
            &FriendshipChanged {
                user_low: a.min(b),
                user_high: a.max(b),
            },
        )
        .unwrap()
    }

    #[test]
    fn timeout_is_clamped() {
        let gateway = DetachedEventGateway::new(
            Arc::new(RecordingPublisher::new()),
            "t",
            Duration::from_secs(30),
        );
        assert_eq!(gateway.timeout(), DetachedEventGateway::MAX_PUBLISH_TIMEOUT);
    }

    #[tokio::test]
    async fn delivers_channel_as_key_and_event_as_payload() {
        let publisher = Arc::new(RecordingPublisher::new());
        let gateway = DetachedEventGateway::new(publisher.clone(), "rapport.events", Duration::from_secs(1));

        gateway.publish(event());
        gateway.publish_batch(vec![event(), event()]);
        gateway.publish_batch(Vec::new());
        gateway.shutdown().await;

        let records = publisher.records();
        assert_eq!(records.len(), 3);
        for record in records {
            assert_eq!(record.topic, "rapport.events");
            assert_eq!(record.key, b"friendship.created");
            let decoded: DomainEvent = serde_json::from_slice(&record.payload).unwrap();
            assert_eq!(decoded.channel, "friendship.created");
            assert_eq!(decoded.receivers.len(), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_transport_never_blocks_the_caller() {
        let publisher = Arc::new(RecordingPublisher::with_delay(Duration::from_secs(60)));
        let gateway = DetachedEventGateway::new(publisher.clone(), "t", Duration::from_millis(500));

        let started = Instant::now();
        gateway.publish(event());
        assert!(started.elapsed() < Duration::from_millis(50));

        gateway.shutdown().await;
        assert!(publisher.records().is_empty(), "timed out delivery must be dropped");
    }

    #[tokio::test]
    async fn transport_errors_are_swallowed() {
        let gateway = DetachedEventGateway::new(Arc::new(FailingPublisher), "t", Duration::from_secs(1));

        gateway.publish(event());
        gateway.publish_batch(vec![event()]);
        gateway.shutdown().await;
    }
}
