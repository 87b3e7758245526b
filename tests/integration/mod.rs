// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// Redis 集成测试
///
/// 需要本机可用的 Docker，默认被忽略：
/// `cargo test -- --ignored`
mod helpers;
mod redis_backend_test;
