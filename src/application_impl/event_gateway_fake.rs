use crate::application_port::EventGateway;
use crate::domain_model::*;
use std::sync::Mutex;

/// Synchronous gateway that keeps every event in memory, so callers can
/// assert on exactly what a service published.
#[derive(Debug, Default)]
pub struct RecordingEventGateway {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn on(&self, channel: Channel) -> Vec<DomainEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.channel == channel.as_str())
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventGateway for RecordingEventGateway {
    fn publish(&self, event: DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn publish_batch(&self, events: Vec<DomainEvent>) {
        if let Ok(mut recorded) = self.events.lock() {
            recorded.extend(events);
        }
    }
}
