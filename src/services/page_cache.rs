//! Cache of rendered list and detail payloads, keyed by request path.
//!
//! Each path holds one entry per query-string variant so that a mutation can
//! drop every variant of a page at once. Cache failures never fail a request:
//! reads fall through to the store and write errors are logged.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use redis::aio::MultiplexedConnection;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::AppError;

/// How long a cached page stays valid without an invalidation.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

const REDIS_KEY_PREFIX: &str = "wellness-admin:page:";

#[derive(Debug)]
struct Entry {
    value: Value,
    stored_at: Instant,
}

enum Backend {
    Memory(RwLock<HashMap<String, HashMap<String, Entry>>>),
    Redis(MultiplexedConnection),
}

pub struct PageCache {
    backend: Backend,
    ttl: Duration,
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.backend {
            Backend::Memory(_) => "memory",
            Backend::Redis(_) => "redis",
        };
        f.debug_struct("PageCache")
            .field("backend", &backend)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl PageCache {
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            backend: Backend::Memory(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn redis(redis_url: &str, ttl: Duration) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            backend: Backend::Redis(conn),
            ttl,
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Memory(_) => "memory",
            Backend::Redis(_) => "redis",
        }
    }

    pub async fn get(&self, path: &str, variant: &str) -> Option<Value> {
        match &self.backend {
            Backend::Memory(pages) => {
                let guard = pages.read().await;
                guard
                    .get(path)
                    .and_then(|variants| variants.get(variant))
                    .filter(|entry| entry.stored_at.elapsed() < self.ttl)
                    .map(|entry| entry.value.clone())
            }
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                let raw = redis::cmd("HGET")
                    .arg(redis_key(path))
                    .arg(variant)
                    .query_async::<Option<String>>(&mut conn)
                    .await;
                match raw {
                    Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!(path, error = %e, "Page cache read failed");
                        None
                    }
                }
            }
        }
    }

    pub async fn put(&self, path: &str, variant: &str, value: &Value) {
        match &self.backend {
            Backend::Memory(pages) => {
                let mut guard = pages.write().await;
                guard.entry(path.to_string()).or_default().insert(
                    variant.to_string(),
                    Entry {
                        value: value.clone(),
                        stored_at: Instant::now(),
                    },
                );
            }
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                let key = redis_key(path);
                let result = redis::pipe()
                    .atomic()
                    .cmd("HSET")
                    .arg(&key)
                    .arg(variant)
                    .arg(value.to_string())
                    .ignore()
                    .cmd("EXPIRE")
                    .arg(&key)
                    .arg(self.ttl.as_secs())
                    .ignore()
                    .query_async::<()>(&mut conn)
                    .await;
                if let Err(e) = result {
                    tracing::warn!(path, error = %e, "Page cache write failed");
                }
            }
        }
    }

    /// Drop every cached variant of the given paths.
    pub async fn invalidate(&self, paths: &[String]) {
        if paths.is_empty() {
            return;
        }
        match &self.backend {
            Backend::Memory(pages) => {
                let mut guard = pages.write().await;
                for path in paths {
                    guard.remove(path);
                }
            }
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                let keys: Vec<String> = paths.iter().map(|p| redis_key(p)).collect();
                let result = redis::cmd("DEL").arg(keys).query_async::<()>(&mut conn).await;
                if let Err(e) = result {
                    tracing::warn!(?paths, error = %e, "Page cache invalidation failed");
                }
            }
        }
        tracing::debug!(?paths, "Invalidated cached pages");
    }

    /// Connectivity probe for readiness checks.
    pub async fn ping(&self) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(_) => Ok(()),
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                redis::cmd("PING").query_async::<String>(&mut conn).await?;
                Ok(())
            }
        }
    }
}

fn redis_key(path: &str) -> String {
    format!("{REDIS_KEY_PREFIX}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_then_get_by_variant() {
        let cache = PageCache::in_memory(DEFAULT_TTL);
        cache.put("/bookings", "status=pending", &json!([1])).await;
        assert_eq!(cache.get("/bookings", "status=pending").await, Some(json!([1])));
        assert_eq!(cache.get("/bookings", "").await, None);
    }

    #[tokio::test]
    async fn invalidate_drops_all_variants_of_path() {
        let cache = PageCache::in_memory(DEFAULT_TTL);
        cache.put("/bookings", "", &json!("a")).await;
        cache.put("/bookings", "page=2", &json!("b")).await;
        cache.put("/bookings/b1", "", &json!("c")).await;

        cache.invalidate(&["/bookings".to_string()]).await;
        assert_eq!(cache.get("/bookings", "").await, None);
        assert_eq!(cache.get("/bookings", "page=2").await, None);
        assert_eq!(cache.get("/bookings/b1", "").await, Some(json!("c")));
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = PageCache::in_memory(Duration::ZERO);
        cache.put("/orders", "", &json!(1)).await;
        assert_eq!(cache.get("/orders", "").await, None);
    }

    #[tokio::test]
    async fn memory_backend_pings() {
        let cache = PageCache::in_memory(DEFAULT_TTL);
        assert!(cache.ping().await.is_ok());
        assert_eq!(cache.backend_name(), "memory");
    }
}
