mod event_publisher_redis;

pub use event_publisher_redis::*;
