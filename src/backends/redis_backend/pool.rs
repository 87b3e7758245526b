// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use deadpool::managed::{self, Metrics, RecycleError, RecycleResult};
use redis::aio::MultiplexedConnection;
use redis::RedisError;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::utils::errors::{CacheError, CacheResult};

/// 连接标识
///
/// 参数完全相同的后端共享同一个连接池。
/// 连接所属运行时失效时由回收检查剔除，因此标识中不包含执行器信息。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionIdentity {
    pub endpoint: String,
    pub port: u16,
    pub encoding: Option<&'static str>,
    pub db: i64,
    pub password: Option<String>,
}

impl fmt::Debug for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionIdentity")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("encoding", &self.encoding)
            .field("db", &self.db)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl fmt::Display for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.endpoint, self.port, self.db)
    }
}

impl ConnectionIdentity {
    /// 生成 Redis 连接 URL，密码会进行 URL 编码
    pub fn redis_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(password),
                self.endpoint,
                self.port,
                self.db
            ),
            None => format!("redis://{}:{}/{}", self.endpoint, self.port, self.db),
        }
    }
}

/// 连接池注册表
///
/// 每个 [`ConnectionIdentity`] 最多初始化一个池。并发的首次使用会等待同一次初始化；
/// 初始化失败时该标识保持未初始化状态，下一次调用重新创建。
pub struct PoolRegistry<P> {
    pools: DashMap<ConnectionIdentity, Arc<OnceCell<Arc<P>>>>,
}

impl<P> Default for PoolRegistry<P> {
    fn default() -> Self {
        Self {
            pools: DashMap::new(),
        }
    }
}

impl<P> PoolRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取或创建连接池
    ///
    /// # 参数
    ///
    /// * `identity` - 连接标识
    /// * `factory` - 标识下尚无连接池时调用的创建函数
    ///
    /// # 返回值
    ///
    /// * `Ok(Arc<P>)` - 共享的连接池
    /// * `Err(CacheError)` - 创建函数返回的错误
    pub async fn acquire<F, Fut>(
        &self,
        identity: &ConnectionIdentity,
        factory: F,
    ) -> CacheResult<Arc<P>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<P>>,
    {
        if let Some(pool) = self.get(identity) {
            return Ok(pool);
        }

        let cell = self.pools.entry(identity.clone()).or_default().clone();
        let pool = cell
            .get_or_try_init(|| async move { factory().await.map(Arc::new) })
            .await?;
        Ok(pool.clone())
    }

    /// 查找已初始化的连接池
    pub fn get(&self, identity: &ConnectionIdentity) -> Option<Arc<P>> {
        self.pools
            .get(identity)
            .and_then(|cell| cell.get().cloned())
    }

    /// 移除连接池
    pub fn remove(&self, identity: &ConnectionIdentity) -> Option<Arc<P>> {
        self.pools
            .remove(identity)
            .and_then(|(_, cell)| cell.get().cloned())
    }

    /// 移除全部连接池
    pub fn drain(&self) -> Vec<Arc<P>> {
        let identities: Vec<ConnectionIdentity> =
            self.pools.iter().map(|entry| entry.key().clone()).collect();
        identities
            .iter()
            .filter_map(|identity| self.remove(identity))
            .collect()
    }

    /// 已初始化的连接池数量
    pub fn len(&self) -> usize {
        self.pools
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Redis 连接管理器
///
/// 创建多路复用连接，回收时发送 PING 检查连接是否可用
pub struct RedisConnectionManager {
    client: redis::Client,
}

impl RedisConnectionManager {
    pub fn new(identity: &ConnectionIdentity) -> CacheResult<Self> {
        let client = redis::Client::open(identity.redis_url().as_str())
            .map_err(|e| CacheError::ConnectionFailure(e.to_string()))?;
        Ok(Self { client })
    }
}

impl managed::Manager for RedisConnectionManager {
    type Type = MultiplexedConnection;
    type Error = RedisError;

    async fn create(&self) -> Result<MultiplexedConnection, RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    async fn recycle(
        &self,
        conn: &mut MultiplexedConnection,
        _: &Metrics,
    ) -> RecycleResult<RedisError> {
        let pong: String = redis::cmd("PING")
            .query_async(conn)
            .await
            .map_err(|e| {
                warn!("Discarding broken redis connection: {}", e);
                RecycleError::Backend(e)
            })?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(RecycleError::Message("Invalid PING response".into()))
        }
    }
}

/// Redis 连接池
pub type RedisPool = managed::Pool<RedisConnectionManager>;

/// 创建连接池并预先建立 `min_size` 个连接
pub async fn create_redis_pool(
    identity: &ConnectionIdentity,
    min_size: usize,
    max_size: usize,
) -> CacheResult<RedisPool> {
    let max_size = max_size.max(1);
    let min_size = min_size.min(max_size);
    let manager = RedisConnectionManager::new(identity)?;
    let pool = RedisPool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| CacheError::ConnectionFailure(e.to_string()))?;

    let warm = futures::future::try_join_all((0..min_size).map(|_| pool.get()))
        .await
        .map_err(|e| CacheError::ConnectionFailure(e.to_string()))?;
    debug!("Warmed {} redis connections for {}", warm.len(), identity);
    drop(warm);

    info!(
        "Created redis pool for {} (min: {}, max: {})",
        identity, min_size, max_size
    );
    Ok(pool)
}
