// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide strategy registry.
//!
//! Lookups of populated slots read an [`ArcSwap`] snapshot and take no lock.
//! Population is serialized by a reentrant mutex and runs in two phases: a
//! pending slot is published first, matchers run, then the slot is patched
//! with the result. A matcher that needs a handle to its own type (or to a
//! type that needs it back) gets the pending slot instead of deadlocking.

use super::overrides::OverrideTable;
use super::strategy::{ErasedStrategy, ExactMatcher, Strategy, StrategyMatcher, TypeKey};
use super::Value;
use crate::contracts::{ValueReader, ValueWriter};
use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use parking_lot::{ReentrantMutex, RwLock};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// A strategy slot: published pending, patched once.
pub(crate) struct Slot {
    key: TypeKey,
    entry: OnceLock<ErasedStrategy>,
}

impl Slot {
    fn pending(key: TypeKey) -> Self {
        Self {
            key,
            entry: OnceLock::new(),
        }
    }

    pub(crate) fn strategy(&self) -> Result<&ErasedStrategy> {
        self.entry
            .get()
            .ok_or_else(|| Error::unsupported(self.key.name, "strategy is still being resolved"))
    }
}

/// Per-type strategy cache plus targeted overrides.
pub struct Registry {
    index: ArcSwap<HashMap<TypeId, Arc<Slot>>>,
    populate: ReentrantMutex<()>,
    matchers: RwLock<Vec<Arc<dyn StrategyMatcher>>>,
    overrides: RwLock<OverrideTable>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("slots", &self.index.load().len())
            .field("matchers", &self.matchers.read().len())
            .field("overrides", &self.overrides.read().len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            index: ArcSwap::from_pointee(HashMap::new()),
            populate: ReentrantMutex::new(()),
            matchers: RwLock::new(Vec::new()),
            overrides: RwLock::new(OverrideTable::default()),
        }
    }

    /// The registry every entry point uses.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    // ========================================================================
    // Matchers
    // ========================================================================

    /// Add a matcher. Later matchers take precedence over earlier ones.
    ///
    /// Strategies resolved before the call are dropped so the new matcher
    /// gets a say; handles already handed out keep their old slot.
    pub fn register_matcher(&self, matcher: impl StrategyMatcher + 'static) {
        let _guard = self.populate.lock();
        self.matchers.write().push(Arc::new(matcher));
        self.index.store(Arc::new(HashMap::new()));
        log::debug!("[registry] matcher registered, strategy cache reset");
    }

    /// Use `strategy` for every `T`, ahead of `T`'s own impl.
    pub fn register<T: Value>(&self, strategy: Strategy<T>) {
        self.register_matcher(ExactMatcher(strategy));
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Strategy for `T`: user matchers first, then `T`'s own [`Value`] impl.
    pub fn resolve<T: Value>(&self) -> Result<Strategy<T>> {
        let key = TypeKey::of::<T>();
        let slot = self.resolve_key(key)?;
        slot.strategy()?
            .typed::<T>()
            .ok_or_else(|| Error::unsupported(key.name, "registered strategy has another type"))
    }

    /// Runtime-typed resolution.
    pub(crate) fn resolve_key(&self, key: TypeKey) -> Result<Arc<Slot>> {
        if let Some(slot) = self.index.load().get(&key.id) {
            if slot.entry.get().is_some() {
                return Ok(Arc::clone(slot));
            }
        }

        let _guard = self.populate.lock();
        let slot = match self.index.load().get(&key.id) {
            Some(slot) if slot.entry.get().is_some() => return Ok(Arc::clone(slot)),
            Some(slot) if self.is_populating(key.id) => {
                // Reentrant request for a type whose matchers are running.
                return Err(Error::unsupported(
                    slot.key.name,
                    "self-referential resolution; take a StrategyHandle instead",
                ));
            }
            Some(slot) => Arc::clone(slot),
            None => self.publish(key),
        };
        self.fill(&slot)?;
        Ok(slot)
    }

    /// Deferred reference to `T`'s slot. Never resolves eagerly, so it is
    /// safe to call from inside a matcher.
    pub fn handle<T: Value>(&self) -> StrategyHandle<T> {
        let key = TypeKey::of::<T>();
        let slot = match self.index.load().get(&key.id) {
            Some(slot) => Arc::clone(slot),
            None => {
                let _guard = self.populate.lock();
                match self.index.load().get(&key.id) {
                    Some(slot) => Arc::clone(slot),
                    None => self.publish(key),
                }
            }
        };
        StrategyHandle {
            slot,
            _type: PhantomData,
        }
    }

    fn publish(&self, key: TypeKey) -> Arc<Slot> {
        let slot = Arc::new(Slot::pending(key));
        self.index.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.entry(key.id).or_insert_with(|| Arc::clone(&slot));
            next
        });
        slot
    }

    fn fill(&self, slot: &Arc<Slot>) -> Result<()> {
        let key = slot.key;
        POPULATING.with(|stack| stack.borrow_mut().push(key.id));
        let made = self.run_matchers(key);
        POPULATING.with(|stack| stack.borrow_mut().pop());

        let strategy = match made {
            Some(strategy) if strategy.type_key() != key => {
                return Err(Error::unsupported(
                    key.name,
                    format!("matcher produced a strategy for {}", strategy.type_key()),
                ));
            }
            Some(strategy) => {
                log::debug!("[registry] {} resolved by matcher", key.name);
                strategy
            }
            None => {
                log::debug!("[registry] {} resolved to its own impl", key.name);
                key.native_strategy()
            }
        };
        // Set can only lose against another fill of the same slot, which the
        // populate lock rules out.
        let _ = slot.entry.set(strategy);
        Ok(())
    }

    fn run_matchers(&self, key: TypeKey) -> Option<ErasedStrategy> {
        // Snapshot so matchers may register handles without holding the lock.
        let matchers: Vec<_> = self.matchers.read().iter().rev().cloned().collect();
        matchers
            .iter()
            .find_map(|matcher| matcher.try_make(key, self))
    }

    fn is_populating(&self, id: TypeId) -> bool {
        POPULATING.with(|stack| stack.borrow().contains(&id))
    }

    // ========================================================================
    // Targeted overrides
    // ========================================================================

    /// Shadow `T`'s strategy for calls whose reader/writer reports `id`.
    pub fn register_targeted<T: Value>(&self, id: u64, strategy: Strategy<T>) {
        self.overrides
            .write()
            .insert(TypeId::of::<T>(), id, ErasedStrategy::new(strategy));
        log::debug!(
            "[registry] targeted override for {} under id {}",
            std::any::type_name::<T>(),
            id
        );
    }

    /// Override for `(T, id)`, if one is registered.
    pub fn targeted<T: Value>(&self, id: u64) -> Option<Strategy<T>> {
        self.overrides
            .read()
            .get(TypeId::of::<T>(), id)
            .and_then(ErasedStrategy::typed::<T>)
    }

    /// Remove every override registered under `id`.
    pub fn remove_targeted(&self, id: u64) -> usize {
        let removed = self.overrides.write().remove_id(id);
        if removed > 0 {
            log::debug!("[registry] swept {} targeted overrides for id {}", removed, id);
        }
        removed
    }

    pub fn has_targeted(&self, id: u64) -> bool {
        self.overrides.read().has_id(id)
    }
}

thread_local! {
    // Types whose matchers are running on this thread.
    static POPULATING: std::cell::RefCell<Vec<TypeId>> = const { std::cell::RefCell::new(Vec::new()) };
}

/// Deferred, typed reference to a registry slot.
///
/// Obtained before the slot is filled; usable once resolution finishes.
pub struct StrategyHandle<T> {
    slot: Arc<Slot>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for StrategyHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            _type: PhantomData,
        }
    }
}

impl<T: Value> StrategyHandle<T> {
    pub fn is_ready(&self) -> bool {
        self.slot.entry.get().is_some()
    }

    pub fn strategy(&self) -> Result<Strategy<T>> {
        self.slot.strategy()?.typed::<T>().ok_or_else(|| {
            Error::unsupported(self.slot.key.name, "registered strategy has another type")
        })
    }

    pub fn write<'a>(&self, value: &'a T, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        (self.strategy()?.write)(value, writer)
    }

    pub fn read(&self, reader: &mut dyn ValueReader) -> Result<T> {
        (self.strategy()?.read)(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::ValueBuffer;

    fn shout<'a>(value: &'a String, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_string(&value.to_uppercase())
    }

    fn write_plain<'a>(value: &'a String, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_string(value)
    }

    fn read_plain(reader: &mut dyn ValueReader) -> Result<String> {
        reader.read_string()
    }

    #[test]
    fn test_resolve_falls_back_to_native() {
        let registry = Registry::new();
        let strategy = registry.resolve::<u32>().unwrap();
        let mut buf = ValueBuffer::new();
        (strategy.write)(&5, &mut buf).unwrap();
        assert_eq!((strategy.read)(&mut buf).unwrap(), 5);
    }

    #[test]
    fn test_latest_matcher_wins() {
        let registry = Registry::new();
        registry.register::<String>(Strategy::new(read_plain, write_plain));
        registry.register::<String>(Strategy::new(read_plain, shout));

        let strategy = registry.resolve::<String>().unwrap();
        let value = "abc".to_string();
        let mut buf = ValueBuffer::new();
        (strategy.write)(&value, &mut buf).unwrap();
        assert_eq!(buf.as_str(), Some("ABC"));
    }

    #[test]
    fn test_registration_resets_cache() {
        let registry = Registry::new();
        let value = "abc".to_string();
        let before = registry.resolve::<String>().unwrap();
        let mut buf = ValueBuffer::new();
        (before.write)(&value, &mut buf).unwrap();
        assert_eq!(buf.as_str(), Some("abc"));

        registry.register::<String>(Strategy::new(read_plain, shout));
        let after = registry.resolve::<String>().unwrap();
        (after.write)(&value, &mut buf).unwrap();
        assert_eq!(buf.as_str(), Some("ABC"));
    }

    #[test]
    fn test_reentrant_resolution_does_not_deadlock() {
        let registry = Registry::new();
        let seen_error = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&seen_error);
        registry.register_matcher(move |key: TypeKey, reg: &Registry| {
            if key != TypeKey::of::<Vec<i32>>() {
                return None;
            }
            // Asking for ourselves eagerly fails fast...
            let err = reg.resolve::<Vec<i32>>().is_err();
            flag.store(err, std::sync::atomic::Ordering::SeqCst);
            // ...but a handle to the pending slot is fine.
            let handle = reg.handle::<Vec<i32>>();
            assert!(!handle.is_ready());
            None
        });

        let strategy = registry.resolve::<Vec<i32>>().unwrap();
        assert!(seen_error.load(std::sync::atomic::Ordering::SeqCst));
        assert!(registry.handle::<Vec<i32>>().is_ready());

        let values = vec![1, 2];
        let mut buf = ValueBuffer::new();
        (strategy.write)(&values, &mut buf).unwrap();
        assert_eq!((strategy.read)(&mut buf).unwrap(), values);
    }

    #[test]
    fn test_handle_taken_before_resolution() {
        let registry = Registry::new();
        let handle = registry.handle::<bool>();
        assert!(!handle.is_ready());
        assert!(handle.strategy().is_err());

        registry.resolve::<bool>().unwrap();
        assert!(handle.is_ready());
        let mut buf = ValueBuffer::new();
        handle.write(&true, &mut buf).unwrap();
        assert!(handle.read(&mut buf).unwrap());
    }

    #[test]
    fn test_mismatched_matcher_is_rejected() {
        let registry = Registry::new();
        registry.register_matcher(|key: TypeKey, _: &Registry| {
            (key == TypeKey::of::<u8>()).then(|| ErasedStrategy::new(Strategy::<u16>::native()))
        });
        assert!(matches!(
            registry.resolve::<u8>(),
            Err(Error::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn test_targeted_overrides() {
        let registry = Registry::new();
        registry.register_targeted::<String>(3, Strategy::new(read_plain, shout));
        registry.register_targeted::<String>(4, Strategy::new(read_plain, shout));
        assert!(registry.targeted::<String>(3).is_some());
        assert!(registry.targeted::<i32>(3).is_none());

        assert_eq!(registry.remove_targeted(3), 1);
        assert!(registry.targeted::<String>(3).is_none());
        assert!(registry.has_targeted(4));
    }

    #[test]
    fn test_concurrent_resolution() {
        let registry = Arc::new(Registry::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        registry.resolve::<i64>().unwrap();
                        registry.resolve::<Vec<String>>().unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert!(registry.handle::<i64>().is_ready());
    }
}
