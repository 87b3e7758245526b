// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use config::{Config, ConfigError};
use tracing::info;

use crate::backends::{
    BackendKind, CacheBackend, ConnectionParams, MemoryBackend, RedisBackend, RedisConfig,
};
use crate::cache::{Cache, KeyBuilder};
use crate::config::resolver::ConfigResolver;
use crate::plugins::{plugin_from_name, CachePlugin, PluginChain};
use crate::serializers::{Serializer, SerializerKind};
use crate::utils::errors::{CacheError, CacheResult};

/// 默认操作超时（秒）
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

/// 缓存构建器
///
/// 每个参数按 `显式设置 > 配置快照 > 默认值` 解析。
/// 未调用 [`CacheBuilder::config`] 时使用进程级配置。
#[derive(Default)]
pub struct CacheBuilder {
    backend: Option<BackendKind>,
    custom_backend: Option<Arc<dyn CacheBackend>>,
    params: ConnectionParams,
    namespace: Option<String>,
    ttl: Option<u64>,
    timeout: Option<Duration>,
    serializer: Option<SerializerKind>,
    plugins: Vec<Arc<dyn CachePlugin>>,
    key_builder: Option<KeyBuilder>,
    config: Option<Arc<Config>>,
}

impl CacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 选择内置后端
    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = Some(kind);
        self
    }

    /// 使用自定义后端实现，连接参数将被忽略
    pub fn with_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.custom_backend = Some(backend);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.params.endpoint = Some(endpoint.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.params.port = Some(port);
        self
    }

    pub fn db(mut self, db: i64) -> Self {
        self.params.db = Some(db);
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.params.password = Some(password.into());
        self
    }

    pub fn pool_min_size(mut self, size: usize) -> Self {
        self.params.pool_min_size = Some(size);
        self
    }

    pub fn pool_max_size(mut self, size: usize) -> Self {
        self.params.pool_max_size = Some(size);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// 默认 TTL（秒），`0` 表示不过期
    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    /// 操作超时，`Duration::ZERO` 表示不限制
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn serializer(mut self, kind: SerializerKind) -> Self {
        self.serializer = Some(kind);
        self
    }

    /// 追加插件，按调用顺序执行
    pub fn plugin(mut self, plugin: Arc<dyn CachePlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// 自定义键构建函数，参数为原始键和命名空间
    pub fn key_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> String + Send + Sync + 'static,
    {
        self.key_builder = Some(Arc::new(builder));
        self
    }

    /// 使用实例级配置快照代替进程级配置
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    /// 构建缓存
    ///
    /// # 返回值
    ///
    /// * `Ok(Cache)` - 缓存实例；Redis 连接池在首次使用时创建
    /// * `Err(CacheError)` - 配置值格式错误、插件名称未知或后端不可用
    pub fn build(self) -> CacheResult<Cache> {
        let resolver = match self.config {
            Some(config) => ConfigResolver::new(config),
            None => ConfigResolver::from_current(),
        };

        let serializer_kind =
            resolver.resolve(self.serializer, "serializer", SerializerKind::default())?;
        let serializer = Serializer::from(serializer_kind);
        let namespace = resolver.resolve_optional(self.namespace, "namespace")?;
        let ttl = resolver.resolve_optional(self.ttl, "ttl")?;
        let timeout = resolve_timeout(self.timeout, &resolver)?;

        let mut plugins = PluginChain::new();
        if self.plugins.is_empty() {
            let names: Vec<String> = resolver.resolve(None, "plugins", Vec::new())?;
            for name in names {
                plugins.register(plugin_from_name(&name)?);
            }
        } else {
            for plugin in self.plugins {
                plugins.register(plugin);
            }
        }

        let backend: Arc<dyn CacheBackend> = match self.custom_backend {
            Some(backend) => backend,
            None => {
                let kind = resolver.resolve(self.backend, "backend", BackendKind::default())?;
                create_backend(kind, &self.params, &resolver, &serializer)?
            }
        };

        info!(
            "Built {} cache (namespace: {:?}, serializer: {:?}, plugins: {:?})",
            backend.kind(),
            namespace,
            serializer_kind,
            plugins.names()
        );

        Ok(Cache {
            backend,
            serializer,
            plugins,
            namespace,
            ttl,
            timeout,
            key_builder: self.key_builder,
        })
    }
}

fn resolve_timeout(
    explicit: Option<Duration>,
    resolver: &ConfigResolver,
) -> CacheResult<Option<Duration>> {
    let timeout = match explicit {
        Some(timeout) => timeout,
        None => {
            let seconds: f64 = resolver.resolve(None, "timeout", DEFAULT_TIMEOUT_SECS)?;
            Duration::try_from_secs_f64(seconds).map_err(|e| {
                CacheError::Config(ConfigError::Message(format!(
                    "invalid cache timeout {}: {}",
                    seconds, e
                )))
            })?
        }
    };
    Ok(Some(timeout).filter(|timeout| !timeout.is_zero()))
}

fn create_backend(
    kind: BackendKind,
    params: &ConnectionParams,
    resolver: &ConfigResolver,
    serializer: &Serializer,
) -> CacheResult<Arc<dyn CacheBackend>> {
    match kind {
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
        BackendKind::Redis => {
            let config = RedisConfig::resolve(params, resolver)?;
            Ok(Arc::new(RedisBackend::new(config, serializer.encoding())))
        }
        #[cfg(feature = "memcached")]
        BackendKind::Memcached => {
            let config = crate::backends::MemcachedConfig::resolve(params, resolver)?;
            Ok(Arc::new(crate::backends::MemcachedBackend::new(config)?))
        }
        #[cfg(not(feature = "memcached"))]
        BackendKind::Memcached => Err(CacheError::Unsupported(
            "memcached backend requires the `memcached` feature".to_string(),
        )),
    }
}
