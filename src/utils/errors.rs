// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use thiserror::Error;

/// 缓存操作结果类型
pub type CacheResult<T> = Result<T, CacheError>;

/// 缓存层错误类型
///
/// 所有后端共享同一套错误分类，调用方可通过 [`CacheError::kind`] 进行模式匹配
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Key {key} already exists, use set to update the value")]
    AlreadyExists { key: String },

    #[error("Value stored in {key} is not an integer")]
    NotANumber { key: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Operation {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[cfg(feature = "memcached")]
    #[error("Memcached error: {0}")]
    Memcached(#[from] memcache::MemcacheError),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Plugin {plugin} failed: {message}")]
    Plugin {
        plugin: &'static str,
        message: String,
    },
}

/// 错误类别
///
/// 去除了具体负载的错误分类，便于调用方按结果类型分支处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConnectionFailure,
    AlreadyExists,
    NotANumber,
    TypeMismatch,
    Timeout,
    BackendProtocol,
    Serialization,
    Config,
    Unsupported,
    Plugin,
}

impl CacheError {
    /// 获取错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::ConnectionFailure(_) => ErrorKind::ConnectionFailure,
            CacheError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CacheError::NotANumber { .. } => ErrorKind::NotANumber,
            CacheError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            CacheError::Timeout { .. } => ErrorKind::Timeout,
            CacheError::Redis(_) | CacheError::Backend(_) => ErrorKind::BackendProtocol,
            #[cfg(feature = "memcached")]
            CacheError::Memcached(_) => ErrorKind::BackendProtocol,
            CacheError::Serialization(_) => ErrorKind::Serialization,
            CacheError::Config(_) => ErrorKind::Config,
            CacheError::Unsupported(_) => ErrorKind::Unsupported,
            CacheError::Plugin { .. } => ErrorKind::Plugin,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for CacheError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for CacheError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}
