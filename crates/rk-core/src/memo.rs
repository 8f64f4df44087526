//! Explicit memoization of expensive pure functions.
//!
//! A cache is owned by whoever evaluates the function (a phase model, a water
//! property evaluator) and has the same lifetime as its owner. Hits return a
//! clone of the stored value, so repeated identical inputs give bit-identical
//! outputs.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

/// Key built from the exact bit patterns of temperature and pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TpKey(u64, u64);

impl TpKey {
    pub fn new(t: f64, p: f64) -> Self {
        Self(t.to_bits(), p.to_bits())
    }
}

/// Bounded key/value cache guarded by a mutex.
#[derive(Debug)]
pub struct MemoizationCache<K, V> {
    entries: Mutex<HashMap<K, V>>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> MemoizationCache<K, V> {
    /// Cache holding at most `capacity` entries (clamped to at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// Errors from `f` are returned and nothing is stored.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        f: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }
        tracing::trace!("memoization cache miss");
        let value = f()?;
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity {
                entries.clear();
            }
            entries.insert(key, value.clone());
        }
        Ok(value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for MemoizationCache<K, V> {
    fn default() -> Self {
        Self::new(64)
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Clone for MemoizationCache<K, V> {
    /// Clones start empty; cached values are an optimization only.
    fn clone(&self) -> Self {
        Self::new(self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn repeated_inputs_hit_the_cache() {
        let cache: MemoizationCache<TpKey, f64> = MemoizationCache::new(4);
        let calls = Cell::new(0);
        let eval = |t: f64, p: f64| {
            cache.get_or_try_insert_with(TpKey::new(t, p), || {
                calls.set(calls.get() + 1);
                Ok::<_, ()>(t.sqrt() * p.ln())
            })
        };
        let a = eval(298.15, 1e5).unwrap();
        let b = eval(298.15, 1e5).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        assert_eq!(calls.get(), 1);
        eval(300.0, 1e5).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache: MemoizationCache<TpKey, f64> = MemoizationCache::new(4);
        let r: Result<f64, &str> = cache.get_or_try_insert_with(TpKey::new(1.0, 1.0), || Err("bad"));
        assert!(r.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_bounds_the_cache() {
        let cache: MemoizationCache<u32, u32> = MemoizationCache::new(2);
        for i in 0..5 {
            cache.get_or_try_insert_with(i, || Ok::<_, ()>(i * 2)).unwrap();
        }
        assert!(cache.len() <= 2);
    }
}
