//! Predicate Cache
//!
//! Maintains in-memory predicate values for every active
//! (userid, botid) pair. Every public set and get checks the size of the
//! cache and spills part of it to the configured backend once a limit is
//! exceeded, starting with the users who have not been heard from the
//! longest.
//!
//! The cache-size counter is kept exact: every mutation adjusts it by
//! the number of stored values it added or removed, and evicting a user
//! subtracts that user's whole value count. Default values are never
//! written back to the backend, but they do count toward the evicted
//! quota.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{error, info, warn};

use crate::config::config::PredicatesConfig;
use crate::models::bot::Bots;
use crate::models::predicate::{PredicateMap, PredicateValue};
use crate::services::normalizer::{normalize_whitespace, remove_markup};
use crate::storage::store::PredicateStore;

/// One user's cached predicates plus an LRU stamp.
struct UserRecord {
    map: PredicateMap,
    touched: u64,
}

/// The session-state manager.
pub struct PredicateCache {
    users: DashMap<(String, String), UserRecord>,
    store: Arc<dyn PredicateStore>,
    bots: Arc<Bots>,
    /// Total cached predicate values across all users.
    cache_size: AtomicUsize,
    cache_max: usize,
    /// Preferred post-eviction size; starts at half of `cache_max` and
    /// moves toward the actually achieved size when eviction overshoots.
    cache_min: AtomicUsize,
    /// Logical clock for least-recently-touched ordering.
    clock: AtomicU64,
    empty_default: String,
    max_index: usize,
}

impl PredicateCache {
    /// Creates a cache over the given backend and bot registry.
    pub fn new(config: &PredicatesConfig, store: Arc<dyn PredicateStore>, bots: Arc<Bots>) -> Self {
        Self {
            users: DashMap::new(),
            store,
            bots,
            cache_size: AtomicUsize::new(0),
            cache_max: config.cache_max,
            cache_min: AtomicUsize::new((config.cache_max / 2).max(1)),
            clock: AtomicU64::new(0),
            empty_default: config.empty_default.clone(),
            max_index: config.max_index,
        }
    }

    /// Maximum index of indexed predicates.
    pub fn max_index(&self) -> usize {
        self.max_index
    }

    /// Total cached predicate values (for metrics).
    pub fn cached_value_count(&self) -> usize {
        self.cache_size.load(Ordering::Relaxed)
    }

    /// Number of users currently cached.
    pub fn cached_user_count(&self) -> usize {
        self.users.len()
    }

    /// Runs a closure against the (created-on-first-access) predicate
    /// map of one user, stamping the LRU clock. Returns the closure
    /// result plus the change in stored value count.
    fn with_record<R>(
        &self,
        userid: &str,
        botid: &str,
        f: impl FnOnce(&mut PredicateMap) -> R,
    ) -> R {
        let key = (userid.to_string(), botid.to_string());
        let stamp = self.clock.fetch_add(1, Ordering::Relaxed);
        let mut record = self.users.entry(key).or_insert_with(|| UserRecord {
            map: PredicateMap::new(),
            touched: 0,
        });
        record.touched = stamp;
        let before = record.map.value_count();
        let result = f(&mut record.map);
        let after = record.map.value_count();
        drop(record);

        if after > before {
            self.cache_size.fetch_add(after - before, Ordering::Relaxed);
        } else if before > after {
            self.cache_size.fetch_sub(before - after, Ordering::Relaxed);
        }
        result
    }

    /// Stores a single-valued predicate and returns the name or the
    /// value, depending on the predicate's return-name-when-set flag.
    pub fn set(&self, name: &str, value: &str, userid: &str, botid: &str) -> String {
        self.with_record(userid, botid, |map| {
            map.put(name, PredicateValue::Single(value.to_string()));
        });
        self.check_cache();
        self.name_or_value(name, value, botid)
    }

    /// Writes into an indexed predicate, converting an existing single
    /// value to indexed form first if needed.
    pub fn set_indexed(
        &self,
        name: &str,
        index: usize,
        value: &str,
        userid: &str,
        botid: &str,
    ) -> String {
        self.ensure_loaded(name, userid, botid);
        self.with_record(userid, botid, |map| match map.get_mut(name) {
            Some(existing) => existing.set(index, value.to_string()),
            None => map.put(name, PredicateValue::Indexed(vec![value.to_string()])),
        });
        self.check_cache();
        self.name_or_value(name, value, botid)
    }

    /// Prepends a new most-recent value onto an indexed predicate,
    /// stripping markup from the value first. Used for the reply- and
    /// input-history stacks.
    pub fn push(&self, name: &str, value: &str, userid: &str, botid: &str) -> String {
        let stripped = normalize_whitespace(&remove_markup(value));
        self.ensure_loaded(name, userid, botid);
        let max_index = self.max_index;
        self.with_record(userid, botid, |map| match map.get_mut(name) {
            Some(existing) => existing.push(stripped.clone(), max_index),
            None => map.put(name, PredicateValue::Indexed(vec![stripped.clone()])),
        });
        self.check_cache();
        self.name_or_value(name, &stripped, botid)
    }

    /// Gets a predicate value; on a cache miss, tries the backend, and
    /// on a total miss falls back to the best available default, which
    /// is then cached.
    pub fn get(&self, name: &str, userid: &str, botid: &str) -> String {
        let cached =
            self.with_record(userid, botid, |map| map.get(name).map(|v| v.first().to_string()));
        if let Some(value) = cached {
            self.check_cache();
            return value;
        }

        let loaded = match self.store.load(name, userid, botid) {
            Ok(value) => value,
            Err(e) => {
                warn!(%name, %userid, %botid, error = %e, "predicate backend load failed");
                None
            }
        };
        let value = loaded.unwrap_or_else(|| self.best_available_default(name, botid));
        self.with_record(userid, botid, |map| {
            map.put(name, PredicateValue::Single(value.clone()));
        });
        self.check_cache();
        value
    }

    /// Gets an indexed predicate value; out-of-range indices yield the
    /// best available default, never an error.
    pub fn get_indexed(&self, name: &str, index: usize, userid: &str, botid: &str) -> String {
        let cached = self.with_record(userid, botid, |map| {
            map.get(name).map(|v| v.get(index).map(str::to_string))
        });
        if let Some(in_cache) = cached {
            self.check_cache();
            return in_cache.unwrap_or_else(|| self.best_available_default(name, botid));
        }

        if let Some(values) = self.load_value_list(name, userid, botid) {
            let result = values.get(index.wrapping_sub(1)).cloned();
            self.with_record(userid, botid, |map| {
                map.put(name, PredicateValue::Indexed(values));
            });
            self.check_cache();
            return result.unwrap_or_else(|| self.best_available_default(name, botid));
        }

        let value = self.best_available_default(name, botid);
        self.with_record(userid, botid, |map| {
            map.put(name, PredicateValue::Single(value.clone()));
        });
        self.check_cache();
        value
    }

    /// Loads an uncached indexed predicate from the backend so indexed
    /// writes extend history instead of clobbering it.
    fn ensure_loaded(&self, name: &str, userid: &str, botid: &str) {
        let cached = self.with_record(userid, botid, |map| map.contains(name));
        if cached {
            return;
        }
        if let Some(values) = self.load_value_list(name, userid, botid) {
            self.with_record(userid, botid, |map| {
                map.put(name, PredicateValue::Indexed(values));
            });
        }
    }

    /// Tries to load an indexed predicate from the backend, reading
    /// indices 1..=max_index until the first gap.
    fn load_value_list(&self, name: &str, userid: &str, botid: &str) -> Option<Vec<String>> {
        let first = match self.store.load(name, userid, botid) {
            Ok(value) => value?,
            Err(e) => {
                warn!(%name, %userid, %botid, error = %e, "predicate backend load failed");
                return None;
            }
        };
        let mut values = vec![first];
        for index in 2..=self.max_index {
            match self.store.load(&format!("{}.{}", name, index), userid, botid) {
                Ok(Some(value)) => values.push(value),
                Ok(None) => break,
                Err(e) => {
                    warn!(%name, %userid, %botid, error = %e, "predicate backend load failed");
                    break;
                }
            }
        }
        Some(values)
    }

    /// Per-bot-configured default for a named predicate, else the
    /// engine-wide empty default.
    pub fn best_available_default(&self, name: &str, botid: &str) -> String {
        self.bots
            .get(botid)
            .and_then(|bot| bot.predicate_info(name).map(|info| info.default.clone()))
            .unwrap_or_else(|| self.empty_default.clone())
    }

    fn name_or_value(&self, name: &str, value: &str, botid: &str) -> String {
        let return_name = self
            .bots
            .get(botid)
            .and_then(|bot| bot.predicate_info(name).map(|info| info.return_name_when_set))
            .unwrap_or(false);
        if return_name {
            name.to_string()
        } else {
            value.to_string()
        }
    }

    /// Checks the cache and spills to the backend if it has reached the
    /// configured maximum.
    fn check_cache(&self) {
        let size = self.cache_size.load(Ordering::Relaxed);
        if size < self.cache_max {
            return;
        }
        let min = self.cache_min.load(Ordering::Relaxed);
        let result = self.evict(size.saturating_sub(min));
        // Adjust the preferred minimum toward what eviction actually
        // achieved, so whole-user granularity does not cause thrashing.
        if result < min {
            self.cache_min
                .store(((result + min) / 2).max(1), Ordering::Relaxed);
        }
    }

    /// Evicts least-recently-touched users until at least `dump_count`
    /// values have left the cache. Non-default values are persisted;
    /// defaults are dropped but still count toward the quota. Returns
    /// the resulting cache size.
    fn evict(&self, dump_count: usize) -> usize {
        let mut order: Vec<((String, String), u64)> = self
            .users
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().touched))
            .collect();
        order.sort_by_key(|(_, touched)| *touched);

        let mut dumped = 0;
        for (key, _) in order {
            if dumped >= dump_count {
                break;
            }
            let Some(((userid, botid), record)) = self.users.remove(&key) else {
                continue;
            };
            dumped += record.map.value_count();
            self.persist_map(&record.map, &userid, &botid);
        }

        self.cache_size.fetch_sub(dumped.min(self.cache_size.load(Ordering::Relaxed)), Ordering::Relaxed);
        self.cache_size.load(Ordering::Relaxed)
    }

    fn persist_map(&self, map: &PredicateMap, userid: &str, botid: &str) {
        for (name, value) in map.iter() {
            let default = self.best_available_default(name, botid);
            for (position, stored) in value.as_list().iter().enumerate() {
                if *stored == default {
                    continue;
                }
                let key = if position == 0 {
                    name.clone()
                } else {
                    format!("{}.{}", name, position + 1)
                };
                if let Err(e) = self.store.save(&key, stored, userid, botid) {
                    error!(%name, %userid, %botid, error = %e, "predicate backend save failed");
                }
            }
        }
    }

    /// Flushes the entire cache to the backend unconditionally. Called
    /// at shutdown.
    pub fn save_all(&self) {
        let count = self.cached_value_count();
        info!(values = count, "saving all cached predicates");
        self.evict(usize::MAX);
    }
}

/// 创建谓词缓存
pub fn create_predicate_cache(
    config: &PredicatesConfig,
    store: Arc<dyn PredicateStore>,
    bots: Arc<Bots>,
) -> Arc<PredicateCache> {
    Arc::new(PredicateCache::new(config, store, bots))
}
