// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identity cache: a chained hash map keyed by 64-bit identities.
//!
//! Keys are already well distributed (pointer addresses, synthetic hashes),
//! so the bucket is simply `key % buckets` over a prime bucket count. Chains
//! are singly linked; the table doubles to the next prime once it holds as
//! many entries as buckets.

use std::fmt;

const MIN_BUCKETS: usize = 3;

struct Node<V> {
    key: u64,
    value: V,
    next: Option<Box<Node<V>>>,
}

/// Map from a 64-bit identity to `V`. Iteration order is unspecified.
pub struct IdCache<V> {
    buckets: Vec<Option<Box<Node<V>>>>,
    len: usize,
}

impl<V> Default for IdCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IdCache<V> {
    pub fn new() -> Self {
        Self::with_capacity(MIN_BUCKETS)
    }

    /// Cache able to hold `capacity` entries before its first resize.
    pub fn with_capacity(capacity: usize) -> Self {
        let size = next_prime(capacity.max(MIN_BUCKETS));
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, || None);
        Self { buckets, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count (always prime).
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Insert a new entry; hands `value` back if `key` is already present.
    pub fn try_insert(&mut self, key: u64, value: V) -> Result<(), V> {
        if self.get(key).is_some() {
            return Err(value);
        }
        self.push_front(key, value);
        Ok(())
    }

    /// Set or insert. Returns the previous value, if any.
    pub fn set(&mut self, key: u64, value: V) -> Option<V> {
        if let Some(slot) = self.get_mut(key) {
            return Some(std::mem::replace(slot, value));
        }
        self.push_front(key, value);
        None
    }

    pub fn get(&self, key: u64) -> Option<&V> {
        let mut cursor = self.buckets[self.bucket_of(key)].as_deref();
        while let Some(node) = cursor {
            if node.key == key {
                return Some(&node.value);
            }
            cursor = node.next.as_deref();
        }
        None
    }

    pub fn get_mut(&mut self, key: u64) -> Option<&mut V> {
        let index = self.bucket_of(key);
        let mut cursor = self.buckets[index].as_deref_mut();
        while let Some(node) = cursor {
            if node.key == key {
                return Some(&mut node.value);
            }
            cursor = node.next.as_deref_mut();
        }
        None
    }

    pub fn contains(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    /// Remove the first entry for `key`.
    pub fn remove(&mut self, key: u64) -> Option<V> {
        let index = self.bucket_of(key);
        let mut cursor = &mut self.buckets[index];
        while cursor.as_ref()?.key != key {
            cursor = &mut cursor.as_mut()?.next;
        }
        let mut node = cursor.take()?;
        *cursor = node.next.take();
        self.len -= 1;
        Some(node.value)
    }

    /// Drop every entry; the bucket array keeps its size.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            let mut chain = bucket.take();
            while let Some(mut node) = chain {
                chain = node.next.take();
            }
        }
        self.len = 0;
    }

    fn bucket_of(&self, key: u64) -> usize {
        (key % self.buckets.len() as u64) as usize
    }

    fn push_front(&mut self, key: u64, value: V) {
        if self.len >= self.buckets.len() {
            self.grow();
        }
        let index = self.bucket_of(key);
        let next = self.buckets[index].take();
        self.buckets[index] = Some(Box::new(Node { key, value, next }));
        self.len += 1;
    }

    fn grow(&mut self) {
        let size = next_prime(self.buckets.len() * 2);
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, || None);
        let old = std::mem::replace(&mut self.buckets, buckets);
        for mut chain in old {
            while let Some(mut node) = chain {
                chain = node.next.take();
                let index = self.bucket_of(node.key);
                node.next = self.buckets[index].take();
                self.buckets[index] = Some(node);
            }
        }
    }
}

impl<V> Drop for IdCache<V> {
    fn drop(&mut self) {
        // Unlink iteratively; a long chain must not recurse through Box drops.
        self.clear();
    }
}

impl<V: fmt::Debug> fmt::Debug for IdCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for bucket in &self.buckets {
            let mut cursor = bucket.as_deref();
            while let Some(node) = cursor {
                map.entry(&node.key, &node.value);
                cursor = node.next.as_deref();
            }
        }
        map.finish()
    }
}

/// Smallest prime `>= n`.
pub(crate) fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: usize) -> bool {
    if n < 4 {
        return n >= 2;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut divisor = 3;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_insert_rejects_duplicates() {
        let mut cache = IdCache::new();
        assert!(cache.try_insert(10, "a").is_ok());
        assert_eq!(cache.try_insert(10, "b"), Err("b"));
        assert_eq!(cache.get(10), Some(&"a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let mut cache = IdCache::new();
        assert_eq!(cache.set(1, 100), None);
        assert_eq!(cache.set(1, 200), Some(100));
        assert_eq!(cache.get(1), Some(&200));
        *cache.get_mut(1).unwrap() += 1;
        assert_eq!(cache.get(1), Some(&201));
    }

    #[test]
    fn test_grows_to_primes() {
        let mut cache = IdCache::new();
        assert_eq!(cache.bucket_count(), 3);
        for key in 0..4u64 {
            cache.set(key * 8, key);
        }
        // 3 -> next prime >= 6
        assert_eq!(cache.bucket_count(), 7);
        for key in 4..100u64 {
            cache.set(key * 8, key);
        }
        assert!(is_prime(cache.bucket_count()));
        assert!(cache.bucket_count() >= cache.len());
        for key in 0..100u64 {
            assert_eq!(cache.get(key * 8), Some(&key));
        }
    }

    #[test]
    fn test_remove_from_chain() {
        // 3 buckets: 0, 3 and 6 collide.
        let mut cache = IdCache::with_capacity(3);
        cache.set(0, 'a');
        cache.set(3, 'b');
        cache.set(6, 'c');
        assert_eq!(cache.remove(3), Some('b'));
        assert_eq!(cache.remove(3), None);
        assert_eq!(cache.get(0), Some(&'a'));
        assert_eq!(cache.get(6), Some(&'c'));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.remove(42), None);
    }

    #[test]
    fn test_clear() {
        let mut cache = IdCache::new();
        for key in 0..20 {
            cache.set(key, key);
        }
        let buckets = cache.bucket_count();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(5), None);
        assert_eq!(cache.bucket_count(), buckets);
    }

    #[test]
    fn test_randomized_against_hashmap() {
        let mut cache = IdCache::new();
        let mut model = std::collections::HashMap::new();
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..2000 {
            let key = rng.u64(0..256);
            match rng.u8(0..3) {
                0 => assert_eq!(cache.set(key, key * 2), model.insert(key, key * 2)),
                1 => assert_eq!(cache.remove(key), model.remove(&key)),
                _ => assert_eq!(cache.get(key), model.get(&key)),
            }
            assert_eq!(cache.len(), model.len());
        }
    }

    #[test]
    fn test_next_prime() {
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(6), 7);
        assert_eq!(next_prime(14), 17);
        assert_eq!(next_prime(97), 97);
    }
}
