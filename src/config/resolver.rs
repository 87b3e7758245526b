// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use config::{Config, ConfigError};
use serde::de::DeserializeOwned;

use crate::config::settings::current_config;
use crate::utils::errors::CacheResult;

/// 配置解析器
///
/// 按 `显式参数 > 实例配置 > 默认值` 的优先级解析每个参数。
/// 解析是对三个输入与当前快照的纯函数，没有副作用。
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    snapshot: Arc<Config>,
    section: String,
}

impl ConfigResolver {
    /// 基于给定快照创建解析器，查找 `cache.` 下的键
    pub fn new(snapshot: Arc<Config>) -> Self {
        Self::with_section(snapshot, "cache")
    }

    /// 基于给定快照和配置段创建解析器
    pub fn with_section(snapshot: Arc<Config>, section: &str) -> Self {
        Self {
            snapshot,
            section: section.to_string(),
        }
    }

    /// 基于进程级配置快照创建解析器
    pub fn from_current() -> Self {
        Self::new(current_config())
    }

    /// 解析一个带默认值的参数
    ///
    /// # 参数
    ///
    /// * `explicit` - 调用方显式传入的值
    /// * `config_key` - 配置键（不含配置段前缀）
    /// * `default` - 后端默认值
    ///
    /// # 返回值
    ///
    /// * `Ok(T)` - 解析结果
    /// * `Err(CacheError::Config)` - 配置中存在该键但格式错误
    pub fn resolve<T: DeserializeOwned>(
        &self,
        explicit: Option<T>,
        config_key: &str,
        default: T,
    ) -> CacheResult<T> {
        Ok(self
            .resolve_optional(explicit, config_key)?
            .unwrap_or(default))
    }

    /// 解析一个默认值为空的参数（如密码、命名空间）
    pub fn resolve_optional<T: DeserializeOwned>(
        &self,
        explicit: Option<T>,
        config_key: &str,
    ) -> CacheResult<Option<T>> {
        if explicit.is_some() {
            return Ok(explicit);
        }
        self.lookup(config_key)
    }

    fn lookup<T: DeserializeOwned>(&self, config_key: &str) -> CacheResult<Option<T>> {
        let key = format!("{}.{}", self.section, config_key);
        match self.snapshot.get::<Option<T>>(&key) {
            Ok(value) => Ok(value),
            Err(ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
