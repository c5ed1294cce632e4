pub mod sessions;

pub use sessions::create_redis_client;
pub use sessions::RedisSessionStore;
