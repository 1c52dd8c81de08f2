// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deduplicating LRU cache keyed by node id with a content-hash side index.
//!
//! Entries live in a slab (`Vec<Option<Slot>>`) threaded onto an intrusive
//! doubly linked recency list, so `get`, `put` and eviction are all O(1).
//! A second map from content hash to slot lets the engine ask "have we already
//! computed this exact content?" without knowing which node produced it.
//!
//! # Invariants
//!
//! - `len() <= capacity()` at all times.
//! - Every key in `by_key` and every hash in `by_hash` points at a live slot,
//!   and eviction removes both pointers together.
//!
//! # Examples
//!
//! ```rust
//! use unified_engine::engine::{DedupCache, ContentHash};
//!
//! let mut cache = DedupCache::new(2);
//! cache.put("a".to_string(), 1, ContentHash::from("h1"));
//! cache.put("b".to_string(), 2, ContentHash::from("h1")); // same content: collapsed
//!
//! assert_eq!(cache.len(), 1);
//! assert_eq!(cache.get("a"), Some(&1));
//! assert_eq!(cache.get("b"), None);
//! assert_eq!(cache.get_by_content(&ContentHash::from("h1")).map(|(k, _)| k.as_str()), Some("a"));
//! ```

use std::collections::HashMap;

use crate::engine::node::{ContentHash, NodeId};

#[derive(Debug)]
struct Slot<V> {
    key: NodeId,
    hash: ContentHash,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// An entry pushed out by [`DedupCache::put`].
#[derive(Debug, Clone, PartialEq)]
pub struct Evicted {
    pub key: NodeId,
    pub hash: ContentHash,
}

/// Outcome of a [`DedupCache::put`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome {
    /// A new entry was stored, possibly evicting the least recently used one
    Inserted { evicted: Option<Evicted> },
    /// The key already existed; its value and hash were replaced
    Updated,
    /// The content hash was already cached under `existing`; only recency changed
    Deduplicated { existing: NodeId },
}

#[derive(Debug)]
pub struct DedupCache<V> {
    capacity: usize,
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
    by_key: HashMap<NodeId, usize>,
    by_hash: HashMap<ContentHash, usize>,
    // most recently used
    head: Option<usize>,
    // least recently used
    tail: Option<usize>,
}

impl<V> DedupCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            by_key: HashMap::with_capacity(capacity),
            by_hash: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn contains_content(&self, hash: &ContentHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Look up by node id and mark the entry most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.by_key.get(key)?;
        self.touch(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Look up without changing recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let idx = *self.by_key.get(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Look up by content hash, returning the occupying key and its value.
    /// Marks the entry most recently used.
    pub fn get_by_content(&mut self, hash: &ContentHash) -> Option<(&NodeId, &V)> {
        let idx = *self.by_hash.get(hash)?;
        self.touch(idx);
        self.slots[idx].as_ref().map(|slot| (&slot.key, &slot.value))
    }

    /// Store `value` under `key`.
    ///
    /// If `hash` is already cached (under any key) the write collapses into a
    /// recency refresh of the existing entry. Otherwise the entry is inserted,
    /// evicting the least recently used one when the cache is full.
    pub fn put(&mut self, key: NodeId, value: V, hash: ContentHash) -> PutOutcome {
        if let Some(&idx) = self.by_hash.get(&hash) {
            self.touch(idx);
            let existing = self.slots[idx]
                .as_ref()
                .map(|slot| slot.key.clone())
                .unwrap_or_default();
            return PutOutcome::Deduplicated { existing };
        }

        if let Some(&idx) = self.by_key.get(&key) {
            if let Some(slot) = self.slots[idx].as_mut() {
                let old_hash = std::mem::replace(&mut slot.hash, hash.clone());
                slot.value = value;
                self.by_hash.remove(&old_hash);
                self.by_hash.insert(hash, idx);
            }
            self.touch(idx);
            return PutOutcome::Updated;
        }

        let evicted = if self.by_key.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let slot = Slot {
            key: key.clone(),
            hash: hash.clone(),
            value,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.by_key.insert(key, idx);
        self.by_hash.insert(hash, idx);
        self.push_front(idx);

        PutOutcome::Inserted { evicted }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.by_key.remove(key)?;
        self.unlink(idx);
        let slot = self.slots[idx].take()?;
        self.by_hash.remove(&slot.hash);
        self.free.push(idx);
        Some(slot.value)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.by_key.clear();
        self.by_hash.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<&NodeId> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match self.slots[idx].as_ref() {
                Some(slot) => {
                    keys.push(&slot.key);
                    cursor = slot.next;
                }
                None => break,
            }
        }
        keys
    }

    fn evict_lru(&mut self) -> Option<Evicted> {
        let idx = self.tail?;
        self.unlink(idx);
        let slot = self.slots[idx].take()?;
        self.by_key.remove(&slot.key);
        self.by_hash.remove(&slot.hash);
        self.free.push(idx);
        Some(Evicted {
            key: slot.key,
            hash: slot.hash,
        })
    }

    fn touch(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(slot) => (slot.prev, slot.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(slot) = self.slots[p].as_mut() {
                    slot.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = None;
            slot.next = None;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = None;
            slot.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(slot) = self.slots[h].as_mut() {
                slot.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> ContentHash {
        ContentHash::from(s)
    }

    #[test]
    fn test_eviction_removes_least_recently_used() {
        let mut cache = DedupCache::new(3);
        cache.put("a".into(), 1, h("ha"));
        cache.put("b".into(), 2, h("hb"));
        cache.put("c".into(), 3, h("hc"));

        // touch a so b becomes the LRU entry
        assert_eq!(cache.get("a"), Some(&1));

        let outcome = cache.put("d".into(), 4, h("hd"));
        assert_eq!(
            outcome,
            PutOutcome::Inserted {
                evicted: Some(Evicted {
                    key: "b".into(),
                    hash: h("hb")
                })
            }
        );
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("b"), None);
        assert!(!cache.contains_content(&h("hb")));
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.get("c"), Some(&3));
        assert_eq!(cache.get("d"), Some(&4));
    }

    #[test]
    fn test_capacity_plus_one_distinct_inserts() {
        let capacity = 4;
        let mut cache = DedupCache::new(capacity);
        for i in 0..=capacity {
            cache.put(format!("k{i}"), i, h(&format!("h{i}")));
        }

        assert_eq!(cache.len(), capacity);
        assert_eq!(cache.get("k0"), None);
        assert!(cache.get_by_content(&h("h0")).is_none());
        for i in 1..=capacity {
            assert_eq!(cache.get(&format!("k{i}")), Some(&i));
        }
    }

    #[test]
    fn test_duplicate_content_collapses_and_refreshes() {
        let mut cache = DedupCache::new(2);
        cache.put("a".into(), 1, h("same"));
        cache.put("b".into(), 2, h("other"));

        // a is LRU now; a duplicate write of its content refreshes it
        let outcome = cache.put("c".into(), 99, h("same"));
        assert_eq!(
            outcome,
            PutOutcome::Deduplicated {
                existing: "a".into()
            }
        );
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek("c"), None);

        // b is evicted rather than a
        cache.put("d".into(), 4, h("fresh"));
        assert!(cache.contains_key("a"));
        assert!(!cache.contains_key("b"));
    }

    #[test]
    fn test_update_same_key_replaces_hash_pointer() {
        let mut cache = DedupCache::new(2);
        cache.put("a".into(), 1, h("v1"));
        assert_eq!(cache.put("a".into(), 2, h("v2")), PutOutcome::Updated);

        assert_eq!(cache.len(), 1);
        assert!(!cache.contains_content(&h("v1")));
        assert_eq!(cache.get_by_content(&h("v2")), Some((&"a".to_string(), &2)));
    }

    #[test]
    fn test_remove_and_slot_reuse() {
        let mut cache = DedupCache::new(2);
        cache.put("a".into(), 1, h("ha"));
        cache.put("b".into(), 2, h("hb"));

        assert_eq!(cache.remove("a"), Some(1));
        assert!(!cache.contains_content(&h("ha")));
        cache.put("c".into(), 3, h("hc"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys_by_recency(), vec!["c", "b"]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache = DedupCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put("a".into(), 1, h("ha"));
        cache.put("b".into(), 2, h("hb"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek("b"), Some(&2));
    }

    #[test]
    fn test_recency_order_tracks_gets() {
        let mut cache = DedupCache::new(3);
        cache.put("a".into(), 1, h("ha"));
        cache.put("b".into(), 2, h("hb"));
        cache.put("c".into(), 3, h("hc"));
        cache.get("a");
        cache.get_by_content(&h("hb"));

        assert_eq!(cache.keys_by_recency(), vec!["b", "a", "c"]);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys_by_recency().is_empty());
    }
}
