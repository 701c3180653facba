use crate::server::EventPublisher;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PublishedRecord {
    pub topic: String,
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Keeps every record it is asked to send, optionally after a delay.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    records: Mutex<Vec<PublishedRecord>>,
    delay: Option<Duration>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    pub fn records(&self) -> Vec<PublishedRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait::async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let record = PublishedRecord {
            topic: topic.to_owned(),
            key: key.to_vec(),
            payload: payload.to_vec(),
        };
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("recording publisher poisoned"))?
            .push(record);
        Ok(())
    }
}

/// Fails every send, like a broker that is down.
pub struct FailingPublisher;

#[async_trait::async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, topic: &str, _key: &[u8], _payload: &[u8]) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("broker unavailable for topic {topic}"))
    }
}
