mod conversation_service;
mod event_gateway;
mod notification_service;
mod relationship_service;

pub use conversation_service::*;
pub use event_gateway::*;
pub use notification_service::*;
pub use relationship_service::*;
