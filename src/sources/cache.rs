//! 搜索源实例内部的小型关键词缓存。
//!
//! 按约定不做逐条过期，而是在访问时检查距离上次清理的间隔，
//! 到期就整体清空。缓存过期只损失一次命中，不会产出错误数据，
//! 所以这种粗粒度策略是可接受的。不依赖后台线程。

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

struct Inner<T> {
    map: HashMap<String, Entry<T>>,
    last_clean: Instant,
}

/// 互斥锁保护的键值缓存，带 TTL 与周期性整体清空。
pub struct KeywordCache<T> {
    ttl: Duration,
    clean_interval: Duration,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> KeywordCache<T> {
    /// 创建缓存。`ttl` 是单条记录的有效期，`clean_interval` 是整体清空周期。
    pub fn new(ttl: Duration, clean_interval: Duration) -> Self {
        Self {
            ttl,
            clean_interval,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                last_clean: Instant::now(),
            }),
        }
    }

    /// 默认配置：TTL 与清空周期均为 1 小时，与原有各站点实现一致。
    pub fn hourly() -> Self {
        Self::new(Duration::from_secs(3600), Duration::from_secs(3600))
    }

    /// 取出未过期的缓存值。
    pub fn get(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock().expect("缓存锁中毒");
        if inner.last_clean.elapsed() >= self.clean_interval {
            inner.map.clear();
            inner.last_clean = Instant::now();
            return None;
        }
        inner
            .map
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// 写入缓存值。
    pub fn insert(&self, key: impl Into<String>, value: T) {
        let mut inner = self.inner.lock().expect("缓存锁中毒");
        inner.map.insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }
}
