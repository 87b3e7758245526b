// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::backends::{BackendKind, CacheBackend, RawReply};
use crate::cache::builder::CacheBuilder;
use crate::cache::KeyBuilder;
use crate::plugins::{Operation, Outcome, PluginChain, PluginContext};
use crate::serializers::Serializer;
use crate::utils::errors::{CacheError, CacheResult};

/// 缓存门面
///
/// 每个操作依次执行：键加命名空间、前置钩子、序列化、后端调用、反序列化、后置钩子。
/// 整个流程受实例超时限制，超时后返回 `Timeout`，已提交到后端的修改不会回滚。
#[derive(Clone)]
pub struct Cache {
    pub(crate) backend: Arc<dyn CacheBackend>,
    pub(crate) serializer: Serializer,
    pub(crate) plugins: PluginChain,
    pub(crate) namespace: Option<String>,
    pub(crate) ttl: Option<u64>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) key_builder: Option<KeyBuilder>,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend.kind())
            .field("serializer", &self.serializer.kind())
            .field("plugins", &self.plugins)
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Cache {
    /// 创建构建器
    pub fn builder() -> CacheBuilder {
        CacheBuilder::new()
    }

    /// 按当前进程配置创建缓存
    pub fn from_config() -> CacheResult<Self> {
        CacheBuilder::new().build()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn default_ttl(&self) -> Option<u64> {
        self.ttl
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    pub fn plugins(&self) -> &PluginChain {
        &self.plugins
    }

    /// 生成后端使用的键
    ///
    /// 配置了自定义构建函数时使用它，否则有命名空间时为 `namespace:key`
    pub fn build_key(&self, key: &str) -> String {
        if let Some(builder) = &self.key_builder {
            return builder(key, self.namespace.as_deref());
        }
        match &self.namespace {
            Some(namespace) => format!("{}:{}", namespace, key),
            None => key.to_string(),
        }
    }

    /// 在实例超时内执行操作
    async fn guarded<T, F>(&self, operation: Operation, fut: F) -> CacheResult<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        match self.timeout {
            Some(after) => tokio::time::timeout(after, fut).await.map_err(|_| {
                debug!("Cache {} timed out after {:?}", operation, after);
                CacheError::Timeout {
                    operation: operation.as_str(),
                    after,
                }
            })?,
            None => fut.await,
        }
    }

    /// 记录结果并执行后置钩子
    async fn complete(&self, ctx: &mut PluginContext, outcome: Outcome) -> CacheResult<()> {
        ctx.finish(outcome);
        self.plugins.run_post(ctx).await?;
        debug!(
            "Cache {} {:?} (ttl: {:?}) finished in {:?}",
            ctx.operation, ctx.keys, ctx.ttl, ctx.elapsed
        );
        Ok(())
    }

    /// 读取单个键
    ///
    /// # 参数
    ///
    /// * `key` - 未加命名空间的键
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(T))` - 命中
    /// * `Ok(None)` - 键不存在
    /// * `Err(CacheError)` - 后端、反序列化、钩子或超时错误
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let key = self.build_key(key);
        self.guarded(Operation::Get, async {
            let mut ctx = PluginContext::new(Operation::Get, vec![key.clone()], None);
            self.plugins.run_pre(&mut ctx).await?;

            let stored = self.backend.get(&key).await?;
            let hit = stored.is_some();
            let value = self.serializer.loads(stored)?;

            self.complete(&mut ctx, Outcome::Hits(vec![hit])).await?;
            Ok(value)
        })
        .await
    }

    /// 批量读取，结果与 `keys` 按位置对齐
    pub async fn multi_get<T, K>(&self, keys: &[K]) -> CacheResult<Vec<Option<T>>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        let keys: Vec<String> = keys.iter().map(|key| self.build_key(key.as_ref())).collect();
        self.guarded(Operation::MultiGet, async {
            let mut ctx = PluginContext::new(Operation::MultiGet, keys.clone(), None);
            self.plugins.run_pre(&mut ctx).await?;

            let stored = self.backend.multi_get(&keys).await?;
            let hits: Vec<bool> = stored.iter().map(Option::is_some).collect();
            let values = stored
                .into_iter()
                .map(|item| self.serializer.loads(item))
                .collect::<CacheResult<Vec<Option<T>>>>()?;

            self.complete(&mut ctx, Outcome::Hits(hits)).await?;
            Ok(values)
        })
        .await
    }

    /// 写入单个键
    ///
    /// `ttl` 为 `None` 时使用实例默认 TTL，`Some(0)` 表示不过期
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<u64>) -> CacheResult<bool>
    where
        T: Serialize + ?Sized,
    {
        let key = self.build_key(key);
        self.guarded(Operation::Set, async {
            let mut ctx = PluginContext::new(Operation::Set, vec![key.clone()], ttl.or(self.ttl));
            self.plugins.run_pre(&mut ctx).await?;

            let data = self.serializer.dumps(value)?;
            let stored = self.backend.set(&key, data, ctx.ttl).await?;

            self.complete(&mut ctx, Outcome::Flag(stored)).await?;
            Ok(stored)
        })
        .await
    }

    /// 原子地批量写入
    ///
    /// `ttl > 0` 时每个键获得相同的过期时间
    pub async fn multi_set<K, T>(&self, pairs: &[(K, T)], ttl: Option<u64>) -> CacheResult<bool>
    where
        K: AsRef<str>,
        T: Serialize,
    {
        let keys: Vec<String> = pairs
            .iter()
            .map(|(key, _)| self.build_key(key.as_ref()))
            .collect();
        self.guarded(Operation::MultiSet, async {
            let mut ctx = PluginContext::new(Operation::MultiSet, keys.clone(), ttl.or(self.ttl));
            self.plugins.run_pre(&mut ctx).await?;

            let mut encoded = Vec::with_capacity(pairs.len());
            for (key, (_, value)) in keys.iter().zip(pairs) {
                encoded.push((key.clone(), self.serializer.dumps(value)?));
            }
            let stored = self.backend.multi_set(encoded, ctx.ttl).await?;

            self.complete(&mut ctx, Outcome::Flag(stored)).await?;
            Ok(stored)
        })
        .await
    }

    /// 仅当键不存在时写入
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 已创建
    /// * `Err(CacheError::AlreadyExists)` - 键已存在，原值保持不变
    pub async fn add<T>(&self, key: &str, value: &T, ttl: Option<u64>) -> CacheResult<bool>
    where
        T: Serialize + ?Sized,
    {
        let key = self.build_key(key);
        self.guarded(Operation::Add, async {
            let mut ctx = PluginContext::new(Operation::Add, vec![key.clone()], ttl.or(self.ttl));
            self.plugins.run_pre(&mut ctx).await?;

            let data = self.serializer.dumps(value)?;
            let created = self.backend.add(&key, data, ctx.ttl).await?;

            self.complete(&mut ctx, Outcome::Flag(created)).await?;
            Ok(created)
        })
        .await
    }

    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        let key = self.build_key(key);
        self.guarded(Operation::Exists, async {
            let mut ctx = PluginContext::new(Operation::Exists, vec![key.clone()], None);
            self.plugins.run_pre(&mut ctx).await?;

            let found = self.backend.exists(&key).await?;

            self.complete(&mut ctx, Outcome::Flag(found)).await?;
            Ok(found)
        })
        .await
    }

    /// 整数自增
    ///
    /// 存储值不是整数时返回 `NotANumber`，原值保持不变
    pub async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let key = self.build_key(key);
        self.guarded(Operation::Increment, async {
            let mut ctx = PluginContext::new(Operation::Increment, vec![key.clone()], None);
            self.plugins.run_pre(&mut ctx).await?;

            let value = self.backend.increment(&key, delta).await?;

            self.complete(&mut ctx, Outcome::Integer(value)).await?;
            Ok(value)
        })
        .await
    }

    /// 设置过期时间，`ttl == 0` 时键变为永久
    pub async fn expire(&self, key: &str, ttl: u64) -> CacheResult<bool> {
        let key = self.build_key(key);
        self.guarded(Operation::Expire, async {
            let mut ctx = PluginContext::new(Operation::Expire, vec![key.clone()], Some(ttl));
            self.plugins.run_pre(&mut ctx).await?;

            let changed = self
                .backend
                .expire(&key, ctx.ttl.unwrap_or_default())
                .await?;

            self.complete(&mut ctx, Outcome::Flag(changed)).await?;
            Ok(changed)
        })
        .await
    }

    /// 删除键，返回实际删除的数量
    pub async fn delete(&self, key: &str) -> CacheResult<u64> {
        let key = self.build_key(key);
        self.guarded(Operation::Delete, async {
            let mut ctx = PluginContext::new(Operation::Delete, vec![key.clone()], None);
            self.plugins.run_pre(&mut ctx).await?;

            let removed = self.backend.delete(&key).await?;

            self.complete(&mut ctx, Outcome::Count(removed)).await?;
            Ok(removed)
        })
        .await
    }

    /// 清空命名空间下的键
    ///
    /// `namespace` 为 `None` 时清空后端整个库，包括不属于本实例命名空间的键。
    /// 这是破坏性操作，只清理本实例的键请传入 `self.namespace()`。
    pub async fn clear(&self, namespace: Option<&str>) -> CacheResult<bool> {
        let keys = namespace.map(|ns| vec![ns.to_string()]).unwrap_or_default();
        self.guarded(Operation::Clear, async {
            let mut ctx = PluginContext::new(Operation::Clear, keys, None);
            self.plugins.run_pre(&mut ctx).await?;

            let cleared = self.backend.clear(namespace).await?;

            self.complete(&mut ctx, Outcome::Flag(cleared)).await?;
            Ok(cleared)
        })
        .await
    }

    /// 直接执行后端原生命令
    ///
    /// 参数不加命名空间，也不做任何校验
    pub async fn raw<A: AsRef<str>>(&self, command: &str, args: &[A]) -> CacheResult<RawReply> {
        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_string()).collect();
        self.guarded(Operation::Raw, async {
            let mut ctx = PluginContext::new(Operation::Raw, Vec::new(), None);
            self.plugins.run_pre(&mut ctx).await?;

            let reply = self.backend.raw(command, &args).await?;

            self.complete(&mut ctx, Outcome::Done).await?;
            Ok(reply)
        })
        .await
    }

    /// 释放后端资源
    pub async fn close(&self) -> CacheResult<()> {
        self.backend.close().await
    }
}
