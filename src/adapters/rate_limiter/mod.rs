//! Rate limiter adapters.
//!
//! - `InMemoryRateLimiter` - single process, clock-injectable for tests
//! - `RedisRateLimiter` - shared counters for multi-instance deployments

mod in_memory;
mod redis;

pub use in_memory::InMemoryRateLimiter;
pub use redis::RedisRateLimiter;
