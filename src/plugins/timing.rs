// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::plugins::{CachePlugin, Operation, PluginContext};
use crate::utils::errors::CacheResult;

/// 单个操作的耗时统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingStats {
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

impl TimingStats {
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total.as_nanos() / u128::from(self.count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// 按操作记录调用次数与耗时
#[derive(Debug, Default)]
pub struct TimingPlugin {
    timings: Mutex<HashMap<Operation, TimingStats>>,
}

impl TimingPlugin {
    pub const NAME: &'static str = "timing";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self, operation: Operation) -> Option<TimingStats> {
        self.timings.lock().get(&operation).copied()
    }

    pub fn snapshot(&self) -> HashMap<Operation, TimingStats> {
        self.timings.lock().clone()
    }
}

#[async_trait]
impl CachePlugin for TimingPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn post(&self, ctx: &mut PluginContext) -> CacheResult<()> {
        let elapsed = ctx.elapsed.unwrap_or_else(|| ctx.started.elapsed());
        let mut timings = self.timings.lock();
        let entry = timings.entry(ctx.operation).or_default();
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
        Ok(())
    }
}
