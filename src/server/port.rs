/// Raw transport beneath the event gateway. Implementations send one record
/// and report failure; the gateway above them owns timeouts and logging.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()>;
}
