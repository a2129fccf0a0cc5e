// Redis-backed response store with lazy, self-healing connection
// Author: kelexine (https://github.com/kelexine)

use super::store::{CacheError, KeyValueStore};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

/// Redis store sharing one multiplexed connection across requests.
///
/// The connection is opened on first use. Concurrent first users are
/// serialized behind `connect_lock` and re-check the handle once they hold it,
/// so only one connection is kept. A failed connect is not remembered: the next
/// operation tries again. An I/O failure on an established connection drops
/// the handle, so a Redis restart heals without restarting the relay.
pub struct RedisStore {
    client: redis::Client,
    connection: RwLock<Option<MultiplexedConnection>>,
    connect_lock: Mutex<()>,
    timeout: Duration,
    endpoint: String,
}

impl RedisStore {
    /// Create a store for `url`. No connection is attempted here.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Backend(format!("invalid Redis URL: {}", e)))?;
        let info = client.get_connection_info();
        let endpoint = format!("{}/{}", info.addr, info.redis.db);

        Ok(Self {
            client,
            connection: RwLock::new(None),
            connect_lock: Mutex::new(()),
            timeout,
            endpoint,
        })
    }

    /// Address this store connects to, for logs and health output.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether a connection handle is currently held.
    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Return the shared connection, opening it if needed.
    async fn ensure_connected(&self) -> Result<MultiplexedConnection, CacheError> {
        // Fast path: already connected.
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let _guard = self.connect_lock.lock().await;

        // Re-check after gaining the lock.
        if let Some(conn) = self.connection.read().await.as_ref() {
            debug!("Redis connection opened by a concurrent request");
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection_with_timeouts(self.timeout, self.timeout)
            .await
            .map_err(|e| {
                crate::metrics::record_store_connection_error();
                error!("Redis connection failed ({}): {}", self.endpoint, e);
                CacheError::Connection(e.to_string())
            })?;

        info!("Redis connected: {}", self.endpoint);
        *self.connection.write().await = Some(conn.clone());
        Ok(conn)
    }

    async fn invalidate(&self) {
        if self.connection.write().await.take().is_some() {
            debug!("Dropped Redis connection handle; next operation reconnects");
        }
    }

    /// Run one command on the shared connection, classifying failures.
    async fn run<T, F, Fut>(&self, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut + Send,
        Fut: Future<Output = Result<T, RedisError>> + Send,
    {
        let conn = self.ensure_connected().await?;

        match f(conn).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_timeout() => {
                self.invalidate().await;
                Err(CacheError::Timeout(self.timeout))
            }
            Err(e) if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() => {
                self.invalidate().await;
                Err(CacheError::Connection(e.to_string()))
            }
            Err(e) => Err(CacheError::Backend(e.to_string())),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.run(|mut conn| async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        self.run(|mut conn| async move { conn.set_ex::<_, _, ()>(key, value, seconds).await })
            .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.run(|mut conn| async move {
            redis::cmd("PING").query_async::<_, String>(&mut conn).await
        })
        .await
        .map(|_| ())
    }
}
