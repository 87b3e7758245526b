// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backends::{effective_ttl, BackendKind, CacheBackend, RawReply};
use crate::utils::errors::{CacheError, CacheResult};

/// 计算过期时刻；超出时钟可表示范围的 TTL 视为永不过期
fn deadline_after(secs: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(secs))
}

/// 缓存条目
#[derive(Clone, Debug)]
struct MemoryEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn new(data: Vec<u8>, ttl: Option<u64>) -> Self {
        Self {
            data,
            expires_at: effective_ttl(ttl).and_then(deadline_after),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}

/// 进程内存后端
///
/// 过期条目在访问时视为不存在并被惰性清理
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<DashMap<String, MemoryEntry>>,
    /// 批量写入时持有写锁，保证批量读取看不到部分写入
    batch_gate: Arc<RwLock<()>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前未过期的条目数
    pub fn len(&self) -> usize {
        self.store.iter().filter(|entry| !entry.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_value(&self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.store.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.data.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.store.remove_if(key, |_, entry| entry.is_expired());
        }
        None
    }

    fn remaining_ttl(&self, key: &str) -> i64 {
        match self.store.get(key) {
            Some(entry) if !entry.is_expired() => match entry.expires_at {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()).as_secs() as i64,
                None => -1,
            },
            _ => -2,
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.live_value(key))
    }

    async fn multi_get(&self, keys: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>> {
        let _gate = self.batch_gate.read();
        Ok(keys.iter().map(|key| self.live_value(key)).collect())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> CacheResult<bool> {
        self.store.insert(key.to_string(), MemoryEntry::new(value, ttl));
        Ok(true)
    }

    async fn multi_set(
        &self,
        pairs: Vec<(String, Vec<u8>)>,
        ttl: Option<u64>,
    ) -> CacheResult<bool> {
        let _gate = self.batch_gate.write();
        for (key, value) in pairs {
            self.store.insert(key, MemoryEntry::new(value, ttl));
        }
        Ok(true)
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> CacheResult<bool> {
        match self.store.entry(key.to_string()) {
            Entry::Occupied(entry) if !entry.get().is_expired() => Err(CacheError::AlreadyExists {
                key: key.to_string(),
            }),
            Entry::Occupied(mut entry) => {
                entry.insert(MemoryEntry::new(value, ttl));
                Ok(true)
            }
            Entry::Vacant(entry) => {
                entry.insert(MemoryEntry::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.live_value(key).is_some())
    }

    async fn increment(&self, key: &str, delta: i64) -> CacheResult<i64> {
        match self.store.entry(key.to_string()) {
            Entry::Occupied(mut entry) if !entry.get().is_expired() => {
                let current = std::str::from_utf8(&entry.get().data)
                    .ok()
                    .and_then(|text| text.trim().parse::<i64>().ok())
                    .ok_or_else(|| CacheError::NotANumber {
                        key: key.to_string(),
                    })?;
                let updated = current.checked_add(delta).ok_or_else(|| {
                    CacheError::Backend("increment or decrement would overflow".to_string())
                })?;
                entry.get_mut().data = updated.to_string().into_bytes();
                Ok(updated)
            }
            Entry::Occupied(mut entry) => {
                entry.insert(MemoryEntry::new(delta.to_string().into_bytes(), None));
                Ok(delta)
            }
            Entry::Vacant(entry) => {
                entry.insert(MemoryEntry::new(delta.to_string().into_bytes(), None));
                Ok(delta)
            }
        }
    }

    async fn expire(&self, key: &str, ttl: u64) -> CacheResult<bool> {
        let Some(mut entry) = self.store.get_mut(key) else {
            return Ok(false);
        };
        if entry.is_expired() {
            return Ok(false);
        }
        if ttl == 0 {
            Ok(entry.expires_at.take().is_some())
        } else {
            entry.expires_at = deadline_after(ttl);
            Ok(true)
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        match self.store.remove(key) {
            Some((_, entry)) if !entry.is_expired() => Ok(1),
            _ => Ok(0),
        }
    }

    async fn clear(&self, namespace: Option<&str>) -> CacheResult<bool> {
        let _gate = self.batch_gate.write();
        match namespace {
            Some(namespace) => {
                let prefix = format!("{}:", namespace);
                self.store.retain(|key, _| !key.starts_with(&prefix));
                debug!("Cleared memory cache namespace: {}", namespace);
            }
            None => {
                self.store.clear();
                warn!("Cleared every memory cache entry");
            }
        }
        Ok(true)
    }

    async fn raw(&self, command: &str, args: &[String]) -> CacheResult<RawReply> {
        match command.to_ascii_lowercase().as_str() {
            "keys" => {
                let mut keys: Vec<String> = self
                    .store
                    .iter()
                    .filter(|entry| !entry.is_expired())
                    .map(|entry| entry.key().clone())
                    .collect();
                keys.sort();
                Ok(RawReply::Bulk(
                    keys.into_iter()
                        .map(|key| RawReply::Data(key.into_bytes()))
                        .collect(),
                ))
            }
            "len" | "dbsize" => Ok(RawReply::Int(self.len() as i64)),
            "ttl" => {
                let key = args.first().ok_or_else(|| {
                    CacheError::Backend("wrong number of arguments for 'ttl'".to_string())
                })?;
                Ok(RawReply::Int(self.remaining_ttl(key)))
            }
            other => Err(CacheError::Backend(format!(
                "unknown memory backend command '{}'",
                other
            ))),
        }
    }
}
