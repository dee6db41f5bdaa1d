//! Ledgerbank Bus — event bus adapters.
//!
//! The in-memory bus backs tests and local development; the Redis Streams
//! bus is the production adapter, with consumer groups and explicit
//! acknowledgements.

pub mod in_memory;
pub mod redis_bus;

pub use in_memory::{InMemoryEventBus, InMemorySubscription};
pub use redis_bus::{RedisBus, RedisSubscription};
