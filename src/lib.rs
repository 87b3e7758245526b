// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 后端模块
///
/// 内存、Redis 与 Memcached 适配器，以及 Redis 连接池注册表
pub mod backends;

/// 缓存门面模块
///
/// 命名空间、序列化、插件钩子与超时在这里统一处理
pub mod cache;

/// 配置模块
///
/// 分层加载配置并按 `显式值 > 配置 > 默认值` 解析参数
pub mod config;

/// 插件模块
pub mod plugins;

/// 序列化模块
pub mod serializers;

/// 工具模块
///
/// 错误类型与日志初始化
pub mod utils;

pub use backends::{BackendKind, CacheBackend, RawReply};
pub use cache::{Cache, CacheBuilder};
pub use plugins::{CachePlugin, Operation, PluginContext};
pub use serializers::{Serializer, SerializerKind};
pub use utils::errors::{CacheError, CacheResult, ErrorKind};
