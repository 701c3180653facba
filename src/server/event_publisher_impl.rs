use crate::server::EventPublisher;
use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

// region kafka

pub struct KafkaPublisher {
    inner: FutureProducer,
    queue_timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(bootstrap_server: &str, client_id: &str, queue_timeout: Duration) -> anyhow::Result<Self> {
        let inner = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_server)
            .set("client.id", client_id)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("compression.type", "lz4")
            .set("message.timeout.ms", queue_timeout.as_millis().to_string())
            .create()?;
        Ok(Self {
            inner,
            queue_timeout,
        })
    }
}

#[async_trait::async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
        let rec = FutureRecord::to(topic).key(key).payload(payload);
        self.inner
            .send(rec, self.queue_timeout)
            .await
            .map(|_delivery_report| ())
            .map_err(|(e, _msg)| anyhow::anyhow!(e))
    }
}

// endregion

// region log

/// Writes every record to the log instead of a broker. Backs the `log`
/// event backend for local runs.
pub struct LogPublisher;

#[async_trait::async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
        tracing::info!(
            topic,
            key = %String::from_utf8_lossy(key),
            payload = %String::from_utf8_lossy(payload),
            "event"
        );
        Ok(())
    }
}

// endregion
