// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::backends::{BackendKind, CacheBackend, ConnectionParams, RawReply};
use crate::config::resolver::ConfigResolver;
use crate::utils::errors::{CacheError, CacheResult};

/// Memcached 后端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcachedConfig {
    pub endpoint: String,
    pub port: u16,
    pub pool_size: u32,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            port: Self::DEFAULT_PORT,
            pool_size: Self::DEFAULT_POOL_SIZE,
        }
    }
}

impl MemcachedConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 11211;
    pub const DEFAULT_POOL_SIZE: u32 = 2;

    pub fn resolve(params: &ConnectionParams, resolver: &ConfigResolver) -> CacheResult<Self> {
        let pool_size: usize = resolver.resolve(
            params.pool_max_size,
            "pool_max_size",
            Self::DEFAULT_POOL_SIZE as usize,
        )?;
        Ok(Self {
            endpoint: resolver.resolve(
                params.endpoint.clone(),
                "endpoint",
                Self::DEFAULT_ENDPOINT.to_string(),
            )?,
            port: resolver.resolve(params.port, "port", Self::DEFAULT_PORT)?,
            pool_size: pool_size.max(1) as u32,
        })
    }

    pub fn url(&self) -> String {
        format!("memcache://{}:{}", self.endpoint, self.port)
    }
}

/// Memcached 后端
///
/// 客户端为阻塞实现，所有调用都在 `spawn_blocking` 中执行。
/// 协议没有事务，`multi_set` 按顺序逐个写入。
#[derive(Clone)]
pub struct MemcachedBackend {
    config: MemcachedConfig,
    client: Arc<memcache::Client>,
}

impl MemcachedBackend {
    pub fn new(config: MemcachedConfig) -> CacheResult<Self> {
        let client = memcache::Client::with_pool_size(config.url().as_str(), config.pool_size)
            .map_err(|e| CacheError::ConnectionFailure(e.to_string()))?;
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    pub fn config(&self) -> &MemcachedConfig {
        &self.config
    }

    async fn blocking<T, F>(&self, f: F) -> CacheResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&memcache::Client) -> CacheResult<T> + Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || f(&client))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?
    }
}

fn expiration(ttl: Option<u64>) -> u32 {
    ttl.map(|seconds| seconds.min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}

#[async_trait]
impl CacheBackend for MemcachedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memcached
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let key = key.to_string();
        self.blocking(move |client| Ok(client.get::<Vec<u8>>(&key)?))
            .await
    }

    async fn multi_get(&self, keys: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keys = keys.to_vec();
        self.blocking(move |client| {
            let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let mut found = client.gets::<Vec<u8>>(&refs)?;
            Ok(keys.iter().map(|key| found.remove(key)).collect())
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> CacheResult<bool> {
        let key = key.to_string();
        self.blocking(move |client| {
            client.set(&key, value.as_slice(), expiration(ttl))?;
            Ok(true)
        })
        .await
    }

    async fn multi_set(
        &self,
        pairs: Vec<(String, Vec<u8>)>,
        ttl: Option<u64>,
    ) -> CacheResult<bool> {
        self.blocking(move |client| {
            for (key, value) in &pairs {
                client.set(key, value.as_slice(), expiration(ttl))?;
            }
            Ok(true)
        })
        .await
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> CacheResult<bool> {
        let key = key.to_string();
        self.blocking(move |client| match client.add(&key, value.as_slice(), expiration(ttl)) {
            Ok(()) => Ok(true),
            Err(e) => {
                if client.get::<Vec<u8>>(&key)?.is_some() {
                    Err(CacheError::AlreadyExists { key })
                } else {
                    Err(e.into())
                }
            }
        })
        .await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let key = key.to_string();
        self.blocking(move |client| {
            let amount = delta.unsigned_abs();
            let result = if delta >= 0 {
                client.increment(&key, amount)
            } else {
                client.decrement(&key, amount)
            };
            match result {
                Ok(value) => Ok(value as i64),
                Err(e) if e.to_string().contains("non-numeric") => {
                    Err(CacheError::NotANumber { key })
                }
                Err(e) => {
                    if client.get::<Vec<u8>>(&key)?.is_some() {
                        return Err(e.into());
                    }
                    // memcached counters are unsigned
                    let seeded = delta.max(0);
                    client.add(&key, seeded.to_string().as_str(), 0)?;
                    Ok(seeded)
                }
            }
        })
        .await
    }

    async fn expire(&self, key: &str, ttl: u64) -> CacheResult<bool> {
        let key = key.to_string();
        self.blocking(move |client| Ok(client.touch(&key, expiration(Some(ttl)))?))
            .await
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        let key = key.to_string();
        self.blocking(move |client| Ok(u64::from(client.delete(&key)?)))
            .await
    }

    async fn clear(&self, namespace: Option<&str>) -> CacheResult<bool> {
        if let Some(namespace) = namespace {
            return Err(CacheError::Unsupported(format!(
                "memcached cannot clear namespace {} without flushing everything",
                namespace
            )));
        }
        warn!("Flushing every key of memcached {}", self.config.url());
        self.blocking(|client| {
            client.flush()?;
            Ok(true)
        })
        .await
    }

    async fn raw(&self, command: &str, args: &[String]) -> CacheResult<RawReply> {
        debug!("Executing raw memcached command {} {:?}", command, args);
        match command.to_ascii_lowercase().as_str() {
            "version" => {
                self.blocking(|client| {
                    let versions = client.version()?;
                    Ok(RawReply::Map(
                        versions
                            .into_iter()
                            .map(|(server, version)| {
                                (RawReply::Status(server), RawReply::Status(version))
                            })
                            .collect(),
                    ))
                })
                .await
            }
            "stats" => {
                self.blocking(|client| {
                    let stats = client.stats()?;
                    Ok(RawReply::Map(
                        stats
                            .into_iter()
                            .map(|(server, values)| {
                                let mut values: Vec<(String, String)> = values.into_iter().collect();
                                values.sort();
                                (
                                    RawReply::Status(server),
                                    RawReply::Map(
                                        values
                                            .into_iter()
                                            .map(|(k, v)| (RawReply::Status(k), RawReply::Status(v)))
                                            .collect(),
                                    ),
                                )
                            })
                            .collect(),
                    ))
                })
                .await
            }
            "flush_all" | "flush" => {
                self.clear(None).await?;
                Ok(RawReply::Status("OK".to_string()))
            }
            other => Err(CacheError::Backend(format!(
                "unsupported memcached command '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Config;

    #[test]
    fn test_resolve_defaults() {
        let resolver = ConfigResolver::new(Arc::new(Config::default()));
        let config = MemcachedConfig::resolve(&ConnectionParams::default(), &resolver).unwrap();
        assert_eq!(config, MemcachedConfig::default());
        assert_eq!(config.url(), "memcache://127.0.0.1:11211");
    }

    #[test]
    fn test_expiration_encoding() {
        assert_eq!(expiration(None), 0);
        assert_eq!(expiration(Some(0)), 0);
        assert_eq!(expiration(Some(30)), 30);
    }
}
