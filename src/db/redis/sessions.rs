use chrono::Utc;
use redis::{AsyncCommands, Client, Script};
use std::fmt::Display;
use uuid::Uuid;

use crate::db::SessionStore;
use crate::error::{AppError, AppResult};
use crate::models::Session;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Session(Uuid),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::Session(id) => write!(f, "session:{}", id),
        }
    }
}

/// Creates a Redis client for the session store
///
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Compare-and-swap write. The record is a hash with `data` (session JSON)
/// and `version` fields; the write lands only when the stored version
/// matches the caller's expectation, so two racing writers cannot both win.
const CAS_PUT_SCRIPT: &str = r#"
local current = redis.call('HGET', KEYS[1], 'version')
if (not current and ARGV[1] == '0') or current == ARGV[1] then
    redis.call('HSET', KEYS[1], 'data', ARGV[2], 'version', ARGV[3])
    redis.call('EXPIRE', KEYS[1], ARGV[4])
    return 1
end
return 0
"#;

/// Redis-backed session store with optimistic versioning
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    cas_put: Script,
}

impl RedisSessionStore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cas_put: Script::new(CAS_PUT_SCRIPT),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: Uuid) -> AppResult<Option<Session>> {
        let key = StoreKey::Session(session_id).to_string();
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let data: Option<String> = conn.hget(&key, "data").await?;
        let Some(json) = data else {
            return Ok(None);
        };

        let session: Session = serde_json::from_str(&json)
            .map_err(|e| AppError::Internal(format!("Session deserialization error: {}", e)))?;

        // TTL lag: a record can outlive its deadline briefly. Treat it as
        // gone and reclaim the key.
        if session.is_expired(Utc::now()) {
            tracing::debug!(session_id = %session_id, "Session past deadline, reclaiming");
            let _: () = conn.del(&key).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn put(&self, session: &Session, ttl_seconds: u64) -> AppResult<bool> {
        let key = StoreKey::Session(session.id).to_string();
        let json = serde_json::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization error: {}", e)))?;
        let expected = session.version.saturating_sub(1);

        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let written: i32 = self
            .cas_put
            .key(&key)
            .arg(expected.to_string())
            .arg(json)
            .arg(session.version.to_string())
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await?;

        if written == 0 {
            tracing::warn!(
                session_id = %session.id,
                expected_version = expected,
                "Session write lost a version race"
            );
        }

        Ok(written == 1)
    }

    async fn delete(&self, session_id: Uuid) -> AppResult<()> {
        let key = StoreKey::Session(session_id).to_string();
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(&key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_key_display() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let key = StoreKey::Session(id);
        assert_eq!(
            format!("{}", key),
            "session:67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }

    // Round-trip tests against a live Redis follow the same opt-in pattern
    // as the rest of the suite: they use REDIS_URL and a disposable key.
    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_put_get_delete_round_trip() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let client = create_redis_client(&redis_url).unwrap();
        let store = RedisSessionStore::new(client);

        let mut session = Session::new("movies".to_string(), "standard".to_string(), 60);
        session.version = 1;

        assert!(store.put(&session, 60).await.unwrap());
        let loaded = store.get(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.version, 1);

        store.delete(session.id).await.unwrap();
        assert!(store.get(session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_stale_version_write_is_rejected() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let client = create_redis_client(&redis_url).unwrap();
        let store = RedisSessionStore::new(client);

        let mut session = Session::new("movies".to_string(), "standard".to_string(), 60);
        session.version = 1;
        assert!(store.put(&session, 60).await.unwrap());

        // A second writer that read version 0 must lose.
        let stale = session.clone();
        assert!(!store.put(&stale, 60).await.unwrap());

        session.version = 2;
        assert!(store.put(&session, 60).await.unwrap());

        store.delete(session.id).await.unwrap();
    }
}
