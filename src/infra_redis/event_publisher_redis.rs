use crate::server::EventPublisher;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Publishes each record on the pub/sub channel `{topic}:{key}`, so
/// subscribers can pattern-match on the event channel.
pub struct RedisPublisher {
    conn: ConnectionManager,
}

impl RedisPublisher {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(dsn: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(dsn)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self::new(conn))
    }

    fn channel(topic: &str, key: &[u8]) -> String {
        format!("{topic}:{}", String::from_utf8_lossy(key))
    }
}

#[async_trait::async_trait]
impl EventPublisher for RedisPublisher {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let subscribers: i64 = conn.publish(Self::channel(topic, key), payload).await?;
        tracing::trace!("redis publish reached {} subscribers", subscribers);
        Ok(())
    }
}
