// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

pub mod base_cache;
pub mod builder;

pub use base_cache::Cache;
pub use builder::{CacheBuilder, DEFAULT_TIMEOUT_SECS};

/// 自定义键构建函数，参数为原始键和实例命名空间
pub type KeyBuilder = Arc<dyn Fn(&str, Option<&str>) -> String + Send + Sync>;
