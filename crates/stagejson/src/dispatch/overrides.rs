// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Targeted strategy overrides keyed by (type, caller id).

use super::strategy::ErasedStrategy;
use crate::idcache::IdCache;
use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

struct Entry {
    type_id: TypeId,
    id: u64,
    strategy: ErasedStrategy,
}

/// Side table of overrides.
///
/// Entries are filed under a synthetic hash of `(TypeId, id)`; colliding
/// pairs share a chain entry and are told apart by the stored pair. A reverse
/// index from `id` to its types makes sweeping an id proportional to what
/// it registered.
#[derive(Default)]
pub(crate) struct OverrideTable {
    entries: IdCache<Vec<Entry>>,
    by_id: HashMap<u64, Vec<TypeId>>,
}

fn synthetic_key(type_id: TypeId, id: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    type_id.hash(&mut hasher);
    id.hash(&mut hasher);
    hasher.finish()
}

impl OverrideTable {
    /// Install or replace the override for `(type_id, id)`.
    pub(crate) fn insert(&mut self, type_id: TypeId, id: u64, strategy: ErasedStrategy) {
        let key = synthetic_key(type_id, id);
        let entry = Entry {
            type_id,
            id,
            strategy,
        };
        match self.entries.get_mut(key) {
            Some(chain) => {
                if let Some(existing) = chain
                    .iter_mut()
                    .find(|e| e.type_id == type_id && e.id == id)
                {
                    *existing = entry;
                    return;
                }
                chain.push(entry);
            }
            None => {
                self.entries.set(key, vec![entry]);
            }
        }
        self.by_id.entry(id).or_default().push(type_id);
    }

    pub(crate) fn get(&self, type_id: TypeId, id: u64) -> Option<&ErasedStrategy> {
        self.entries
            .get(synthetic_key(type_id, id))?
            .iter()
            .find(|e| e.type_id == type_id && e.id == id)
            .map(|e| &e.strategy)
    }

    /// Drop every override registered under `id`; returns how many went.
    pub(crate) fn remove_id(&mut self, id: u64) -> usize {
        let Some(types) = self.by_id.remove(&id) else {
            return 0;
        };
        let mut removed = 0;
        for type_id in types {
            let key = synthetic_key(type_id, id);
            let now_empty = match self.entries.get_mut(key) {
                Some(chain) => {
                    let before = chain.len();
                    chain.retain(|e| !(e.type_id == type_id && e.id == id));
                    removed += before - chain.len();
                    chain.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.entries.remove(key);
            }
        }
        removed
    }

    pub(crate) fn has_id(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.values().map(Vec::len).sum()
    }
}
