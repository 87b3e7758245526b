// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use deadpool::managed::Object;
use once_cell::sync::Lazy;
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::backends::{effective_ttl, BackendKind, CacheBackend, ConnectionParams, RawReply};
use crate::config::resolver::ConfigResolver;
use crate::utils::errors::{CacheError, CacheResult};

pub mod pool;

pub use pool::{ConnectionIdentity, PoolRegistry, RedisConnectionManager, RedisPool};

/// 进程级 Redis 连接池注册表
static REDIS_POOLS: Lazy<PoolRegistry<RedisPool>> = Lazy::new(PoolRegistry::new);

const SCAN_BATCH: usize = 100;
const DELETE_BATCH: usize = 500;

/// Redis 后端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub endpoint: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    pub pool_min_size: usize,
    pub pool_max_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            port: Self::DEFAULT_PORT,
            db: Self::DEFAULT_DB,
            password: None,
            pool_min_size: Self::DEFAULT_POOL_MIN_SIZE,
            pool_max_size: Self::DEFAULT_POOL_MAX_SIZE,
        }
    }
}

impl RedisConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 6379;
    pub const DEFAULT_DB: i64 = 0;
    pub const DEFAULT_POOL_MIN_SIZE: usize = 1;
    pub const DEFAULT_POOL_MAX_SIZE: usize = 10;

    /// 按 `显式参数 > 配置 > 默认值` 解析连接参数
    pub fn resolve(params: &ConnectionParams, resolver: &ConfigResolver) -> CacheResult<Self> {
        Ok(Self {
            endpoint: resolver.resolve(
                params.endpoint.clone(),
                "endpoint",
                Self::DEFAULT_ENDPOINT.to_string(),
            )?,
            port: resolver.resolve(params.port, "port", Self::DEFAULT_PORT)?,
            db: resolver.resolve(params.db, "db", Self::DEFAULT_DB)?,
            password: resolver.resolve_optional(params.password.clone(), "password")?,
            pool_min_size: resolver.resolve(
                params.pool_min_size,
                "pool_min_size",
                Self::DEFAULT_POOL_MIN_SIZE,
            )?,
            pool_max_size: resolver.resolve(
                params.pool_max_size,
                "pool_max_size",
                Self::DEFAULT_POOL_MAX_SIZE,
            )?,
        })
    }
}

/// Redis 后端
///
/// 连接池在首次使用时按 [`ConnectionIdentity`] 创建，并与参数相同的其他实例共享
#[derive(Clone)]
pub struct RedisBackend {
    config: RedisConfig,
    identity: ConnectionIdentity,
}

impl RedisBackend {
    /// 创建 Redis 后端
    ///
    /// # 参数
    ///
    /// * `config` - 连接参数
    /// * `encoding` - 序列化器的文本编码，参与连接标识
    pub fn new(config: RedisConfig, encoding: Option<&'static str>) -> Self {
        let identity = ConnectionIdentity {
            endpoint: config.endpoint.clone(),
            port: config.port,
            encoding,
            db: config.db,
            password: config.password.clone(),
        };
        Self { config, identity }
    }

    /// 进程级连接池注册表
    pub fn registry() -> &'static PoolRegistry<RedisPool> {
        &REDIS_POOLS
    }

    /// 关闭并移除注册表中的全部连接池
    pub fn close_all() -> usize {
        let pools = REDIS_POOLS.drain();
        for pool in &pools {
            pool.close();
        }
        info!("Closed {} redis pools", pools.len());
        pools.len()
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    /// 获取（必要时创建）共享连接池
    pub async fn pool(&self) -> CacheResult<Arc<RedisPool>> {
        REDIS_POOLS
            .acquire(&self.identity, || {
                pool::create_redis_pool(
                    &self.identity,
                    self.config.pool_min_size,
                    self.config.pool_max_size,
                )
            })
            .await
    }

    /// 从连接池中取出一个连接
    async fn connection(&self) -> CacheResult<Object<RedisConnectionManager>> {
        let pool = self.pool().await?;
        pool.get()
            .await
            .map_err(|e| CacheError::ConnectionFailure(e.to_string()))
    }
}

/// 把 Redis 原生回复转换为后端无关的表示
fn to_raw_reply(value: redis::Value) -> RawReply {
    match value {
        redis::Value::Nil => RawReply::Nil,
        redis::Value::Int(number) => RawReply::Int(number),
        redis::Value::BulkString(bytes) => RawReply::Data(bytes),
        redis::Value::SimpleString(text) => RawReply::Status(text),
        redis::Value::Okay => RawReply::Status("OK".to_string()),
        redis::Value::Array(items) | redis::Value::Set(items) => {
            RawReply::Bulk(items.into_iter().map(to_raw_reply).collect())
        }
        redis::Value::Map(pairs) => RawReply::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (to_raw_reply(k), to_raw_reply(v)))
                .collect(),
        ),
        redis::Value::Double(number) => RawReply::Double(number),
        redis::Value::Boolean(flag) => RawReply::Bool(flag),
        other => RawReply::Other(format!("{:?}", other)),
    }
}

/// INCRBY 对非整数值返回的错误
fn is_not_integer_error(err: &redis::RedisError) -> bool {
    let message = err.to_string();
    message.contains("not an integer")
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Redis
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn multi_get(&self, keys: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection().await?;
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut *conn)
            .await?;
        Ok(values)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(seconds) = effective_ttl(ttl) {
            cmd.arg("EX").arg(seconds);
        }
        let _: () = cmd.query_async(&mut *conn).await?;
        Ok(true)
    }

    async fn multi_set(
        &self,
        pairs: Vec<(String, Vec<u8>)>,
        ttl: Option<u64>,
    ) -> CacheResult<bool> {
        if pairs.is_empty() {
            return Ok(true);
        }
        let mut conn = self.connection().await?;

        let mut pipe = redis::pipe();
        pipe.atomic().cmd("MSET");
        for (key, value) in &pairs {
            pipe.arg(key.as_str()).arg(value.as_slice());
        }
        pipe.ignore();
        if let Some(seconds) = effective_ttl(ttl) {
            for (key, _) in &pairs {
                pipe.cmd("EXPIRE").arg(key.as_str()).arg(seconds).ignore();
            }
        }
        let _: () = pipe.query_async(&mut *conn).await?;
        Ok(true)
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(seconds) = effective_ttl(ttl) {
            cmd.arg("EX").arg(seconds);
        }
        let reply: redis::Value = cmd.query_async(&mut *conn).await?;
        if matches!(reply, redis::Value::Nil) {
            return Err(CacheError::AlreadyExists {
                key: key.to_string(),
            });
        }
        Ok(true)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        let count: u64 = conn.exists(key).await?;
        Ok(count > 0)
    }

    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<i64> = conn.incr(key, delta).await;
        match result {
            Ok(value) => Ok(value),
            Err(e) if is_not_integer_error(&e) => Err(CacheError::NotANumber {
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn expire(&self, key: &str, ttl: u64) -> CacheResult<bool> {
        // Redis deletes the key on a negative EXPIRE
        let seconds = i64::try_from(ttl)
            .map_err(|_| CacheError::Backend(format!("invalid expire time {}", ttl)))?;
        let mut conn = self.connection().await?;
        let changed: bool = if seconds == 0 {
            conn.persist(key).await?
        } else {
            conn.expire(key, seconds).await?
        };
        Ok(changed)
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed)
    }

    async fn clear(&self, namespace: Option<&str>) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        let Some(namespace) = namespace else {
            warn!("Flushing every key of redis db {} on {}", self.config.db, self.identity);
            let _: () = redis::cmd("FLUSHDB").query_async(&mut *conn).await?;
            return Ok(true);
        };

        let pattern = format!("{}:*", namespace);
        let mut matched: Vec<Vec<u8>> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await?;
            matched.extend(keys);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        let mut removed: u64 = 0;
        for chunk in matched.chunks(DELETE_BATCH) {
            let count: u64 = redis::cmd("DEL")
                .arg(chunk)
                .query_async(&mut *conn)
                .await?;
            removed += count;
        }
        debug!(
            "Cleared {} redis keys matching {} on {}",
            removed, pattern, self.identity
        );
        Ok(true)
    }

    async fn raw(&self, command: &str, args: &[String]) -> CacheResult<RawReply> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd(command);
        for arg in args {
            cmd.arg(arg.as_str());
        }
        let reply: redis::Value = cmd.query_async(&mut *conn).await?;
        Ok(to_raw_reply(reply))
    }

    async fn close(&self) -> CacheResult<()> {
        if let Some(pool) = REDIS_POOLS.remove(&self.identity) {
            pool.close();
            info!("Closed redis pool for {}", self.identity);
        }
        Ok(())
    }
}
