// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::errors::CacheResult;

/// 二进制序列化器
///
/// 使用 MessagePack 编码任意可序列化的结构，结构体字段按名称编码
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickleSerializer;

impl PickleSerializer {
    pub const ENCODING: Option<&'static str> = None;

    pub fn dumps<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    pub fn loads<T: DeserializeOwned>(&self, bytes: &[u8]) -> CacheResult<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
