use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::engine::normalize_title;
use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Metadata looked up by display title
    MetadataByTitle(String),
    /// Metadata looked up by the provider's own id
    MetadataById(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MetadataByTitle(title) => write!(f, "meta:title:{}", normalize_title(title)),
            CacheKey::MetadataById(id) => write!(f, "meta:id:{}", id),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Pending write handed to the background writer
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed cache for enrichment lookups
///
/// Reads go straight to Redis; writes are queued and flushed by a background
/// task so a response never waits on a cache write.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer to flush queued writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates the cache and spawns its background writer
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0;
                    while let Some(msg) = write_rx.recv().await {
                        match Self::write_to_redis(&client, msg).await {
                            Ok(()) => flushed += 1,
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to flush cache write during shutdown")
                            }
                        }
                    }
                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Reads and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a write without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[test]
    fn test_cache_key_by_title_is_normalized() {
        let key = CacheKey::MetadataByTitle("  The MATRIX! ".to_string());
        assert_eq!(key.to_string(), "meta:title:the matrix");
    }

    #[test]
    fn test_cache_key_by_id() {
        let key = CacheKey::MetadataById("603".to_string());
        assert_eq!(key.to_string(), "meta:id:603");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client);

        let key = CacheKey::MetadataById("nonexistent_key_12345".to_string());
        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();

        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_shutdown_flushes_pending_writes() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::new(client.clone());

        let key = CacheKey::MetadataByTitle("cache shutdown test".to_string());
        let value = vec!["flushed".to_string()];
        cache.set_in_background(&key, &value, 60);

        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
