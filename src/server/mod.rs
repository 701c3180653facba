mod event_gateway_impl;
mod event_publisher_fake;
mod event_publisher_impl;
mod port;
mod server;

pub use event_gateway_impl::*;
pub use event_publisher_fake::*;
pub use event_publisher_impl::*;
pub use port::*;
pub use server::*;
