// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::de::value::{Error as ValueError, StringDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Serialize;

use crate::utils::errors::{CacheError, CacheResult};

/// 文本透传序列化器
///
/// 只接受字符串值，原样写入后端。其他类型请使用
/// [`super::PickleSerializer`] 或 [`super::JsonSerializer`]。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultSerializer;

impl DefaultSerializer {
    pub const ENCODING: Option<&'static str> = Some("utf-8");

    pub fn dumps<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Vec<u8>> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::String(text)) => Ok(text.into_bytes()),
            _ => Err(CacheError::TypeMismatch(
                "DefaultSerializer only supports str types, for other types use PickleSerializer or JsonSerializer"
                    .to_string(),
            )),
        }
    }

    pub fn loads<T: DeserializeOwned>(&self, bytes: &[u8]) -> CacheResult<T> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CacheError::Serialization(e.to_string()))?
            .to_string();
        let deserializer: StringDeserializer<ValueError> = text.into_deserializer();
        T::deserialize(deserializer).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}
