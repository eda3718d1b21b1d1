//! Fixed-capacity LRU map.
//!
//! Recency is a monotonically increasing tick stamped on every access;
//! `order` maps ticks back to keys so the oldest entry is the first key
//! of the `BTreeMap`.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::num::NonZeroUsize;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    tick: u64,
}

/// Map holding at most `capacity` entries, evicting the least recently
/// used one on overflow.
///
/// Both [`get`](Self::get) and [`insert`](Self::insert) count as a use.
/// [`peek`](Self::peek) does not.
#[derive(Debug, Clone)]
pub struct BoundedLru<K, V> {
    capacity: NonZeroUsize,
    entries: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    tick: u64,
}

impl<K, V> BoundedLru<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.get()),
            order: BTreeMap::new(),
            tick: 0,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Look up a key and mark it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let tick = self.next_tick();
        let slot = self.entries.get_mut(key)?;
        if let Some(owned) = self.order.remove(&slot.tick) {
            self.order.insert(tick, owned);
        }
        slot.tick = tick;
        Some(&slot.value)
    }

    /// Look up a key without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Insert or replace a value, marking it most recently used.
    ///
    /// Returns the evicted entry when a new key overflows the capacity.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let tick = self.next_tick();

        if let Some(slot) = self.entries.get_mut(&key) {
            self.order.remove(&slot.tick);
            slot.tick = tick;
            slot.value = value;
            self.order.insert(tick, key);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity.get() {
            self.pop_lru()
        } else {
            None
        };

        self.order.insert(tick, key.clone());
        self.entries.insert(key, Slot { value, tick });
        evicted
    }

    /// Remove a key.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.tick);
        Some(slot.value)
    }

    /// Remove and return the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        let slot = self.entries.remove(&key)?;
        Some((key, slot.value))
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> BoundedLru<String, u32> {
        BoundedLru::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_insert_and_get() {
        let mut lru = cache(2);
        assert!(lru.insert("a".into(), 1).is_none());
        assert_eq!(lru.get("a"), Some(&1));
        assert_eq!(lru.len(), 1);
        assert!(lru.get("missing").is_none());
    }

    #[test]
    fn test_overflow_evicts_least_recently_used() {
        let mut lru = cache(2);
        lru.insert("a".into(), 1);
        lru.insert("b".into(), 2);
        let evicted = lru.insert("c".into(), 3);
        assert_eq!(evicted, Some(("a".to_string(), 1)));
        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("a"));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut lru = cache(2);
        lru.insert("a".into(), 1);
        lru.insert("b".into(), 2);
        lru.get("a");
        let evicted = lru.insert("c".into(), 3);
        assert_eq!(evicted, Some(("b".to_string(), 2)));
        assert!(lru.contains("a"));
    }

    #[test]
    fn test_peek_does_not_refresh_recency() {
        let mut lru = cache(2);
        lru.insert("a".into(), 1);
        lru.insert("b".into(), 2);
        assert_eq!(lru.peek("a"), Some(&1));
        let evicted = lru.insert("c".into(), 3);
        assert_eq!(evicted, Some(("a".to_string(), 1)));
    }

    #[test]
    fn test_replace_existing_key_does_not_evict() {
        let mut lru = cache(2);
        lru.insert("a".into(), 1);
        lru.insert("b".into(), 2);
        assert!(lru.insert("a".into(), 10).is_none());
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.peek("a"), Some(&10));
        let order: Vec<_> = lru.keys_by_recency().cloned().collect();
        assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_capacity_1024_evicts_exactly_one() {
        let mut lru = cache(1024);
        for i in 0..1024u32 {
            assert!(lru.insert(format!("vm-{i}"), i).is_none());
        }
        assert_eq!(lru.len(), 1024);

        let evicted = lru.insert("vm-1024".into(), 1024);
        assert_eq!(evicted, Some(("vm-0".to_string(), 0)));
        assert_eq!(lru.len(), 1024);
        assert!(lru.contains("vm-1"));
        assert!(lru.contains("vm-1024"));
    }

    #[test]
    fn test_remove_and_pop() {
        let mut lru = cache(3);
        lru.insert("a".into(), 1);
        lru.insert("b".into(), 2);
        assert_eq!(lru.remove("a"), Some(1));
        assert_eq!(lru.pop_lru(), Some(("b".to_string(), 2)));
        assert!(lru.is_empty());
        assert!(lru.pop_lru().is_none());
    }

    #[test]
    fn test_clear() {
        let mut lru = cache(3);
        lru.insert("a".into(), 1);
        lru.clear();
        assert!(lru.is_empty());
        assert_eq!(lru.keys_by_recency().count(), 0);
    }
}
