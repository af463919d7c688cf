//! [`QueueBridge`](crate::domain::ports::QueueBridge) adapters.
//!
//! - [`InMemoryQueueBridge`]: records messages per channel; used by tests.
//! - [`RedisQueueBridge`]: `LPUSH` onto `queue:<channel>` lists.
//! - [`StubQueueBridge`]: accepts nothing; every message is undeliverable.

mod in_memory;
mod redis_queue;
mod stub;

pub use in_memory::{InMemoryQueueBridge, QueuedMessage};
pub use redis_queue::RedisQueueBridge;
pub use stub::StubQueueBridge;
