// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;

use crate::plugins::{CachePlugin, Operation, Outcome, PluginContext};
use crate::utils::errors::CacheResult;

/// 命中率统计
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HitMissStats {
    pub hits: u64,
    pub misses: u64,
    pub total: u64,
    pub hit_ratio: f64,
}

/// 统计 `get` 与 `multi_get` 的命中和未命中次数
#[derive(Debug, Default)]
pub struct HitMissRatioPlugin {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitMissRatioPlugin {
    pub const NAME: &'static str = "hit_miss_ratio";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HitMissStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_ratio = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        HitMissStats {
            hits,
            misses,
            total,
            hit_ratio,
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[async_trait]
impl CachePlugin for HitMissRatioPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handles(&self, operation: Operation) -> bool {
        matches!(operation, Operation::Get | Operation::MultiGet)
    }

    async fn post(&self, ctx: &mut PluginContext) -> CacheResult<()> {
        if let Outcome::Hits(hits) = &ctx.outcome {
            let hit_count = hits.iter().filter(|hit| **hit).count() as u64;
            self.hits.fetch_add(hit_count, Ordering::Relaxed);
            self.misses
                .fetch_add(hits.len() as u64 - hit_count, Ordering::Relaxed);
        }
        Ok(())
    }
}
