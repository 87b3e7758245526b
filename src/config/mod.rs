// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理缓存配置的加载以及参数的分层解析
pub mod resolver;
pub mod settings;
