mod conversation_service_impl;
mod event_gateway_fake;
mod notification_service_impl;
mod relationship_service_impl;
mod store_deadline;

pub use conversation_service_impl::*;
pub use event_gateway_fake::*;
pub use notification_service_impl::*;
pub use relationship_service_impl::*;
pub use store_deadline::*;
