// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 序列化模块
//!
//! 负责在应用值与后端存储表示（字节串）之间转换。
//! 所有序列化器都满足 `loads(None) == None`。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::utils::errors::CacheResult;

pub mod default_serializer;
pub mod json_serializer;
pub mod pickle_serializer;

pub use default_serializer::DefaultSerializer;
pub use json_serializer::JsonSerializer;
pub use pickle_serializer::PickleSerializer;

/// 序列化器类型，用于配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializerKind {
    /// 文本透传
    #[default]
    Default,
    /// 二进制编码
    Pickle,
    /// JSON 文本编码
    Json,
}

/// 序列化器
///
/// 每个缓存实例只使用一种序列化器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serializer {
    Default(DefaultSerializer),
    Pickle(PickleSerializer),
    Json(JsonSerializer),
}

impl Default for Serializer {
    fn default() -> Self {
        Serializer::Default(DefaultSerializer)
    }
}

impl From<SerializerKind> for Serializer {
    fn from(kind: SerializerKind) -> Self {
        match kind {
            SerializerKind::Default => Serializer::Default(DefaultSerializer),
            SerializerKind::Pickle => Serializer::Pickle(PickleSerializer),
            SerializerKind::Json => Serializer::Json(JsonSerializer),
        }
    }
}

impl Serializer {
    /// 序列化器类型
    pub fn kind(&self) -> SerializerKind {
        match self {
            Serializer::Default(_) => SerializerKind::Default,
            Serializer::Pickle(_) => SerializerKind::Pickle,
            Serializer::Json(_) => SerializerKind::Json,
        }
    }

    /// 存储表示的文本编码，二进制编码返回 `None`
    pub fn encoding(&self) -> Option<&'static str> {
        match self {
            Serializer::Default(_) => DefaultSerializer::ENCODING,
            Serializer::Pickle(_) => PickleSerializer::ENCODING,
            Serializer::Json(_) => JsonSerializer::ENCODING,
        }
    }

    /// 将应用值转换为存储表示
    ///
    /// # 参数
    ///
    /// * `value` - 待序列化的值
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<u8>)` - 存储表示
    /// * `Err(CacheError::TypeMismatch)` - 序列化器不支持该值
    pub fn dumps<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Vec<u8>> {
        match self {
            Serializer::Default(s) => s.dumps(value),
            Serializer::Pickle(s) => s.dumps(value),
            Serializer::Json(s) => s.dumps(value),
        }
    }

    /// 将存储表示还原为应用值，`None` 始终还原为 `None`
    pub fn loads<T: DeserializeOwned>(&self, stored: Option<Vec<u8>>) -> CacheResult<Option<T>> {
        let Some(bytes) = stored else {
            return Ok(None);
        };
        let value = match self {
            Serializer::Default(s) => s.loads(&bytes)?,
            Serializer::Pickle(s) => s.loads(&bytes)?,
            Serializer::Json(s) => s.loads(&bytes)?,
        };
        Ok(Some(value))
    }
}
