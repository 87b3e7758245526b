// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::backends::BackendKind;
use crate::serializers::SerializerKind;

/// 进程级配置快照
static ACTIVE_CONFIG: Lazy<RwLock<Arc<Config>>> =
    Lazy::new(|| RwLock::new(Arc::new(Config::default())));

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 缓存配置
    pub cache: CacheSettings,
}

/// 缓存配置设置
///
/// 未设置的字段由 [`crate::config::resolver::ConfigResolver`] 回退到后端默认值
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// 后端类型
    pub backend: BackendKind,
    /// 服务地址
    pub endpoint: Option<String>,
    /// 服务端口
    pub port: Option<u16>,
    /// 数据库编号
    pub db: Option<i64>,
    /// 密码
    pub password: Option<String>,
    /// 连接池最小连接数
    pub pool_min_size: Option<usize>,
    /// 连接池最大连接数
    pub pool_max_size: Option<usize>,
    /// 键命名空间
    pub namespace: Option<String>,
    /// 默认过期时间（秒）
    pub ttl: Option<u64>,
    /// 操作超时时间（秒），0 表示不限制
    pub timeout: Option<f64>,
    /// 序列化器
    pub serializer: Option<SerializerKind>,
    /// 插件列表
    #[serde(default)]
    pub plugins: Vec<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{CACHERS_ENVIRONMENT}` 文件
    /// 以及 `CACHERS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        load_config()?.try_deserialize()
    }

    /// 从已有的配置快照中解析
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.clone().try_deserialize()
    }
}

/// 构建分层配置
///
/// 只为与后端无关的键提供默认值，后端相关的默认值由各后端自行给出
pub fn load_config() -> Result<Config, ConfigError> {
    let env = std::env::var("CACHERS_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
    Config::builder()
        .set_default("cache.backend", "memory")?
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", env)).required(false))
        .add_source(
            Environment::with_prefix("CACHERS")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}

/// 替换进程级配置快照
///
/// 已构建的缓存实例不受影响，仅作用于之后创建的实例
pub fn set_config(config: Config) {
    *ACTIVE_CONFIG.write() = Arc::new(config);
}

/// 获取当前进程级配置快照
pub fn current_config() -> Arc<Config> {
    ACTIVE_CONFIG.read().clone()
}

/// 将进程级配置恢复为空配置
pub fn reset_config() {
    set_config(Config::default());
}
