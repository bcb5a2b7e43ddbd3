//! Live score fan-out over an in-process bus and Redis.

pub mod event_bus;
pub mod message;
pub mod notifier;
pub mod redis_stream;

pub use event_bus::*;
pub use message::*;
pub use notifier::*;
pub use redis_stream::*;
