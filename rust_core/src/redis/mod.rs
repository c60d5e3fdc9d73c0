pub mod store;
pub mod streams;

pub use store::{RedisGameStore, RedisUpcomingIndex};
pub use streams::{ReconnectConfig, RedisStreamSource, StreamSettings};
