use crate::domain_model::*;

/// Outbound integration point towards the real-time delivery service.
///
/// Both calls return immediately. Delivery is best-effort: implementations
/// log and drop failures and never report them to the caller, whose state
/// change is already persisted.
pub trait EventGateway: Send + Sync {
    fn publish(&self, event: DomainEvent);
    fn publish_batch(&self, events: Vec<DomainEvent>);
}

impl dyn EventGateway {
    /// Builds and publishes an event. A payload that fails to serialize is
    /// logged and dropped like any other delivery failure.
    pub fn emit<T: serde::Serialize>(&self, channel: Channel, receivers: Vec<UserId>, payload: &T) {
        match DomainEvent::new(channel, receivers, payload) {
            Ok(event) => self.publish(event),
            Err(e) => tracing::warn!(%channel, error = %e, "compose event"),
        }
    }
}
