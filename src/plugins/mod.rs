// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 插件钩子链
//!
//! 插件在每个缓存操作前后被调用，只能观察或调整 TTL，不能跳过底层操作。
//! 任一插件返回错误时剩余钩子和本次操作都会中止。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::utils::errors::{CacheError, CacheResult};

pub mod hit_miss;
pub mod timing;

pub use hit_miss::{HitMissRatioPlugin, HitMissStats};
pub use timing::{TimingPlugin, TimingStats};

/// 缓存操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Get,
    MultiGet,
    Set,
    MultiSet,
    Add,
    Exists,
    Increment,
    Expire,
    Delete,
    Clear,
    Raw,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::Get,
        Operation::MultiGet,
        Operation::Set,
        Operation::MultiSet,
        Operation::Add,
        Operation::Exists,
        Operation::Increment,
        Operation::Expire,
        Operation::Delete,
        Operation::Clear,
        Operation::Raw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::MultiGet => "multi_get",
            Operation::Set => "set",
            Operation::MultiSet => "multi_set",
            Operation::Add => "add",
            Operation::Exists => "exists",
            Operation::Increment => "increment",
            Operation::Expire => "expire",
            Operation::Delete => "delete",
            Operation::Clear => "clear",
            Operation::Raw => "raw",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作结果摘要，供后置钩子读取
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// 操作尚未完成
    #[default]
    Pending,
    /// 每个键是否命中，与 `keys` 按位置对齐
    Hits(Vec<bool>),
    Flag(bool),
    Count(u64),
    Integer(i64),
    Done,
}

/// 单次操作的上下文
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub operation: Operation,
    /// 已加命名空间的键
    pub keys: Vec<String>,
    /// 前置钩子可以改写，门面使用改写后的值
    pub ttl: Option<u64>,
    pub started: Instant,
    /// 在后置钩子执行前设置
    pub elapsed: Option<Duration>,
    pub outcome: Outcome,
}

impl PluginContext {
    pub fn new(operation: Operation, keys: Vec<String>, ttl: Option<u64>) -> Self {
        Self {
            operation,
            keys,
            ttl,
            started: Instant::now(),
            elapsed: None,
            outcome: Outcome::Pending,
        }
    }

    /// 记录结果和耗时
    pub fn finish(&mut self, outcome: Outcome) {
        self.elapsed = Some(self.started.elapsed());
        self.outcome = outcome;
    }
}

/// 缓存插件
///
/// `handles` 在注册时检查一次，链中只为声明支持的操作保留该插件
#[async_trait]
pub trait CachePlugin: Send + Sync {
    /// 插件名称
    fn name(&self) -> &'static str;

    /// 是否处理给定操作
    fn handles(&self, _operation: Operation) -> bool {
        true
    }

    /// 操作执行前调用
    async fn pre(&self, _ctx: &mut PluginContext) -> CacheResult<()> {
        Ok(())
    }

    /// 操作结果反序列化后调用
    async fn post(&self, _ctx: &mut PluginContext) -> CacheResult<()> {
        Ok(())
    }
}

/// 有序插件链
#[derive(Clone, Default)]
pub struct PluginChain {
    plugins: Vec<Arc<dyn CachePlugin>>,
    by_operation: HashMap<Operation, Vec<Arc<dyn CachePlugin>>>,
}

impl fmt::Debug for PluginChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginChain")
            .field("plugins", &self.names())
            .finish()
    }
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按注册顺序追加插件
    pub fn register(&mut self, plugin: Arc<dyn CachePlugin>) {
        for operation in Operation::ALL {
            if plugin.handles(operation) {
                self.by_operation
                    .entry(operation)
                    .or_default()
                    .push(plugin.clone());
            }
        }
        debug!("Registered cache plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn for_operation(&self, operation: Operation) -> &[Arc<dyn CachePlugin>] {
        self.by_operation
            .get(&operation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 依次执行前置钩子，遇到错误立即返回
    pub async fn run_pre(&self, ctx: &mut PluginContext) -> CacheResult<()> {
        for plugin in self.for_operation(ctx.operation) {
            plugin.pre(ctx).await?;
        }
        Ok(())
    }

    /// 依次执行后置钩子，遇到错误立即返回
    pub async fn run_post(&self, ctx: &mut PluginContext) -> CacheResult<()> {
        for plugin in self.for_operation(ctx.operation) {
            plugin.post(ctx).await?;
        }
        Ok(())
    }
}

/// 按名称创建内置插件
///
/// # 参数
///
/// * `name` - `hit_miss_ratio` 或 `timing`
///
/// # 返回值
///
/// * `Ok(Arc<dyn CachePlugin>)` - 插件实例
/// * `Err(CacheError::Config)` - 名称未知
pub fn plugin_from_name(name: &str) -> CacheResult<Arc<dyn CachePlugin>> {
    match name {
        HitMissRatioPlugin::NAME => Ok(Arc::new(HitMissRatioPlugin::new())),
        TimingPlugin::NAME => Ok(Arc::new(TimingPlugin::new())),
        other => Err(CacheError::Config(config::ConfigError::Message(format!(
            "unknown cache plugin '{}'",
            other
        )))),
    }
}
