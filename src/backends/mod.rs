// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 后端适配器模块
//!
//! 每个适配器把统一的缓存操作翻译为具体存储的原语。
//! 适配器只处理已加命名空间的键和已序列化的值。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::errors::CacheResult;

#[cfg(feature = "memcached")]
pub mod memcached_backend;
pub mod memory_backend;
pub mod redis_backend;

#[cfg(feature = "memcached")]
pub use memcached_backend::{MemcachedBackend, MemcachedConfig};
pub use memory_backend::MemoryBackend;
pub use redis_backend::{ConnectionIdentity, PoolRegistry, RedisBackend, RedisConfig};

/// 后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// 进程内存
    #[default]
    Memory,
    /// Redis 协议存储
    Redis,
    /// Memcached 协议存储
    Memcached,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Redis => write!(f, "redis"),
            BackendKind::Memcached => write!(f, "memcached"),
        }
    }
}

/// 调用方显式传入的连接参数
///
/// 未设置的字段依次回退到配置和后端默认值
#[derive(Debug, Clone, Default)]
pub struct ConnectionParams {
    pub endpoint: Option<String>,
    pub port: Option<u16>,
    pub db: Option<i64>,
    pub password: Option<String>,
    pub pool_min_size: Option<usize>,
    pub pool_max_size: Option<usize>,
}

/// `raw` 操作返回的后端原生结果
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    Nil,
    Int(i64),
    Double(f64),
    Bool(bool),
    Data(Vec<u8>),
    Status(String),
    Bulk(Vec<RawReply>),
    Map(Vec<(RawReply, RawReply)>),
    Other(String),
}

impl RawReply {
    /// 以文本形式读取 `Data` 或 `Status` 结果
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawReply::Data(bytes) => String::from_utf8(bytes.clone()).ok(),
            RawReply::Status(text) => Some(text.clone()),
            _ => None,
        }
    }
}

/// 缓存后端接口
///
/// 所有方法都使用 `&self`，实现需要自行处理内部可变性。
/// TTL 以秒为单位，`None` 与 `Some(0)` 都表示不过期。
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// 后端类型
    fn kind(&self) -> BackendKind;

    /// 读取单个键，不存在时返回 `None`
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// 批量读取，结果与 `keys` 按位置对齐
    async fn multi_get(&self, keys: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>>;

    /// 写入单个键
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> CacheResult<bool>;

    /// 批量写入，`ttl > 0` 时所有键获得相同的过期时间
    async fn multi_set(&self, pairs: Vec<(String, Vec<u8>)>, ttl: Option<u64>)
        -> CacheResult<bool>;

    /// 仅当键不存在时写入，否则返回 `AlreadyExists`
    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> CacheResult<bool>;

    /// 检查键是否存在
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// 整数自增，存储值不是整数时返回 `NotANumber`
    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64>;

    /// 设置过期时间，`ttl == 0` 时移除过期时间
    async fn expire(&self, key: &str, ttl: u64) -> CacheResult<bool>;

    /// 删除键，返回实际删除的数量
    async fn delete(&self, key: &str) -> CacheResult<u64>;

    /// 清空命名空间；不带命名空间时清空整个库
    async fn clear(&self, namespace: Option<&str>) -> CacheResult<bool>;

    /// 直接执行后端原生命令
    async fn raw(&self, command: &str, args: &[String]) -> CacheResult<RawReply>;

    /// 释放后端持有的资源
    async fn close(&self) -> CacheResult<()> {
        Ok(())
    }
}

/// 把 `Option<u64>` TTL 归一化为“需要设置的过期秒数”
pub(crate) fn effective_ttl(ttl: Option<u64>) -> Option<u64> {
    ttl.filter(|seconds| *seconds > 0)
}
