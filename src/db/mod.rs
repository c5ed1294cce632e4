pub mod redis;

pub use redis::create_redis_client;
pub use redis::RedisSessionStore;

use crate::error::AppResult;
use crate::models::Session;
use uuid::Uuid;

/// Read/write contract for session records.
///
/// `put` is a compare-and-swap: the write succeeds only if the stored
/// version equals `session.version - 1` (or the key is absent for version
/// 1). Callers bump `session.version` before writing and retry the whole
/// read-modify-write on a `false` return.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session, or `None` when it is missing or past its TTL
    async fn get(&self, session_id: Uuid) -> AppResult<Option<Session>>;

    /// Versioned write-back with TTL refresh; `false` on version conflict
    async fn put(&self, session: &Session, ttl_seconds: u64) -> AppResult<bool>;

    /// Removes a session record (explicit reset)
    async fn delete(&self, session_id: Uuid) -> AppResult<()>;
}
