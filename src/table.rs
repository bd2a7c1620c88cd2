//! Table: separately chained buckets over a pooled binding arena.
//!
//! The bucket array holds the head of each chain; chains are singly linked
//! through `Binding::next` and every binding lives in the table's
//! [`EntryPool`]. New bindings are pushed at the head of their chain, so a
//! chain reads most-recent-first.
//!
//! Sizing follows the prime table: a table created for `n` expected
//! entries gets the smallest prime above `n / 4` buckets, and an insertion
//! that finds `len / 8 >= size` first grows the table to the smallest
//! prime above `6 * (len / 8)`.
//!
//! Each binding caches its hash, so resizing relinks nodes without calling
//! back into the strategy. Only `set_strategy` recomputes hashes.

use crate::builder::TableBuilder;
use crate::dispose::{Destructors, KeyDestructor, ValueDestructor};
use crate::error::TableError;
use crate::iter::{Drain, Iter, IterMut, Keys, Values, ValuesMut};
use crate::pool::{Binding, BindingKey, EntryPool, PoolConfig, PoolStats};
use crate::primes;
use crate::strategy::{Exact, KeyStrategy};
use core::borrow::Borrow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Reference-counted handle to a table shared by several owners.
pub type SharedTable<K, V, H = Exact> = Rc<RefCell<Table<K, V, H>>>;

pub struct Table<K, V, H = Exact> {
    pub(crate) buckets: Vec<Option<BindingKey>>,
    pub(crate) len: usize,
    pub(crate) strategy: H,
    pub(crate) destructors: Destructors<K, V>,
    pub(crate) pool: EntryPool<K, V>,
    scratch: Vec<BindingKey>,
    mutations: u64,
}

/// Position of a binding: its bucket, its predecessor in the chain (if
/// any) and its own key.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Found {
    pub(crate) bucket: usize,
    pub(crate) prev: Option<BindingKey>,
    pub(crate) at: BindingKey,
}

impl<K, V> Table<K, V> {
    /// An empty table with the smallest bucket count.
    pub fn new() -> Self {
        Self::from_parts(
            primes::PRIMES[0],
            Exact,
            Destructors::none(),
            PoolConfig::default(),
        )
    }

    /// An empty table sized for `expected` entries.
    pub fn with_expected_len(expected: usize) -> Result<Self, TableError> {
        Self::with_strategy(expected, Exact)
    }

    pub fn builder() -> TableBuilder<K, V> {
        TableBuilder::new()
    }
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H> Table<K, V, H> {
    /// An empty table sized for `expected` entries, placing keys with
    /// `strategy`.
    pub fn with_strategy(expected: usize, strategy: H) -> Result<Self, TableError> {
        Self::with_parts(expected, strategy, Destructors::none(), PoolConfig::default())
    }

    pub(crate) fn with_parts(
        expected: usize,
        strategy: H,
        destructors: Destructors<K, V>,
        pool: PoolConfig,
    ) -> Result<Self, TableError> {
        let size = primes::size_for_entries(expected)
            .ok_or(TableError::CapacityExceeded { requested: expected })?;
        Ok(Self::from_parts(size, strategy, destructors, pool))
    }

    pub(crate) fn from_parts(
        size: usize,
        strategy: H,
        destructors: Destructors<K, V>,
        pool: PoolConfig,
    ) -> Self {
        Self {
            buckets: vec![None; size],
            len: 0,
            strategy,
            destructors,
            pool: EntryPool::new(pool),
            scratch: Vec::new(),
            mutations: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count.
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    /// Counter bumped by every operation that may change the table.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    pub fn strategy(&self) -> &H {
        &self.strategy
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn pool_config(&self) -> PoolConfig {
        self.pool.config()
    }

    /// Number of bindings in each chain, in bucket order.
    pub fn chain_lengths(&self) -> Vec<usize> {
        (0..self.buckets.len())
            .map(|idx| self.chain(idx).count())
            .collect()
    }

    pub fn into_shared(self) -> SharedTable<K, V, H> {
        Rc::new(RefCell::new(self))
    }

    pub fn destructors(&self) -> &Destructors<K, V> {
        &self.destructors
    }

    /// Replace the disposal hooks. Placement does not depend on them, so
    /// no entry moves.
    pub fn set_destructors(
        &mut self,
        key: Option<KeyDestructor<K>>,
        value: Option<ValueDestructor<V>>,
    ) {
        self.destructors = Destructors::new(key, value);
    }

    /// Free pooled shells and scratch buffers and rebuild the arena at
    /// the live size. Entries keep their values and chain positions.
    pub fn release_pool(&mut self) {
        self.pool.shrink(&mut self.buckets);
        self.scratch = Vec::new();
        self.mutations += 1;
    }

    pub fn fetch<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyStrategy<Q>,
    {
        let found = self.locate(key)?;
        Some(&self.binding(found.at).value)
    }

    pub fn fetch_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyStrategy<Q>,
    {
        let found = self.locate(key)?;
        self.pool.get_mut(found.at).map(|b| &mut b.value)
    }

    pub fn fetch_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyStrategy<Q>,
    {
        let found = self.locate(key)?;
        let b = self.binding(found.at);
        Some((&b.key, &b.value))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyStrategy<Q>,
    {
        self.locate(key).is_some()
    }

    /// Remove `key`, destroying the stored key and returning the value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyStrategy<Q>,
    {
        let (k, v) = self.remove_entry(key)?;
        self.destructors.destroy_key(k);
        Some(v)
    }

    /// Remove `key` and hand both the stored key and the value back.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyStrategy<Q>,
    {
        let found = self.locate(key)?;
        Some(self.remove_found(found))
    }

    /// Detach every entry. With `destroy` the destructors run on each key
    /// and value; otherwise they are dropped. Shells go back to the pool
    /// and the bucket count is kept.
    pub fn clear(&mut self, destroy: bool) {
        self.mutations += 1;
        for idx in 0..self.buckets.len() {
            let mut cur = self.buckets[idx].take();
            while let Some(bk) = cur {
                let b = self
                    .pool
                    .release(bk)
                    .expect("chain links must point at live bindings");
                cur = b.next;
                self.len -= 1;
                if destroy {
                    self.destructors.destroy(b.key, b.value);
                }
            }
        }
        debug_assert_eq!(self.len, 0);
        self.compact_if_sparse();
    }

    /// Resize to the smallest prime strictly greater than `size_hint`.
    pub fn resize(&mut self, size_hint: usize) -> Result<(), TableError> {
        let size = primes::covering_prime(size_hint).ok_or(TableError::CapacityExceeded {
            requested: size_hint,
        })?;
        self.resize_exact(size);
        Ok(())
    }

    /// Resize for `entries` expected entries, as at construction.
    pub fn resize_for(&mut self, entries: usize) -> Result<(), TableError> {
        let size = primes::size_for_entries(entries)
            .ok_or(TableError::CapacityExceeded { requested: entries })?;
        self.resize_exact(size);
        Ok(())
    }

    /// Resize to exactly `size` buckets (at least one), bypassing the
    /// prime table.
    pub fn resize_exact(&mut self, size: usize) {
        let size = size.max(1);
        if size == self.buckets.len() {
            return;
        }
        #[cfg(feature = "logging")]
        log::debug!(
            "resizing table from {} to {} buckets ({} entries)",
            self.buckets.len(),
            size,
            self.len
        );
        self.relink(size);
    }

    /// Visit every entry once; the visitor may update values in place.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&K, &mut V)) {
        for idx in 0..self.buckets.len() {
            let mut cur = self.buckets[idx];
            while let Some(bk) = cur {
                let b = self
                    .pool
                    .get_mut(bk)
                    .expect("chain links must point at live bindings");
                f(&b.key, &mut b.value);
                cur = b.next;
            }
        }
    }

    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for idx in 0..self.buckets.len() {
            for b in self.chain(idx) {
                f(&b.key, &b.value);
            }
        }
    }

    /// Detach entries one by one, handing ownership to the caller.
    pub fn drain(&mut self) -> Drain<'_, K, V, H> {
        self.mutations += 1;
        Drain::new(self)
    }

    /// Detach every entry and pass it to `f`.
    pub fn drain_with(&mut self, mut f: impl FnMut(K, V)) {
        for (k, v) in self.drain() {
            f(k, v);
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.pool, &self.buckets, self.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.pool, self.len)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Snapshot of every entry, in unspecified order.
    pub fn to_vec(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn into_vec(mut self) -> Vec<(K, V)> {
        self.drain().collect()
    }

    #[inline]
    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    #[inline]
    pub(crate) fn binding(&self, bk: BindingKey) -> &Binding<K, V> {
        self.pool
            .get(bk)
            .expect("chain links must point at live bindings")
    }

    pub(crate) fn chain(&self, idx: usize) -> Chain<'_, K, V> {
        Chain {
            pool: &self.pool,
            cur: self.buckets[idx],
        }
    }

    pub(crate) fn bump(&mut self) {
        self.mutations += 1;
    }

    fn locate<Q>(&self, key: &Q) -> Option<Found>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyStrategy<Q>,
    {
        let hash = <H as KeyStrategy<Q>>::hash_key(&self.strategy, key);
        self.locate_by(hash, |k| {
            <H as KeyStrategy<Q>>::eq_keys(&self.strategy, key, k.borrow())
        })
    }

    /// Find the binding with cached hash `hash` whose key satisfies `eq`.
    pub(crate) fn locate_by(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<Found> {
        let bucket = self.bucket_of(hash);
        let mut prev = None;
        let mut cur = self.buckets[bucket];
        while let Some(bk) = cur {
            let b = self.binding(bk);
            if b.hash == hash && eq(&b.key) {
                return Some(Found {
                    bucket,
                    prev,
                    at: bk,
                });
            }
            prev = cur;
            cur = b.next;
        }
        None
    }

    /// Push a new binding at the head of `bucket`.
    pub(crate) fn link(&mut self, bucket: usize, key: K, value: V, hash: u64) -> BindingKey {
        let next = self.buckets[bucket];
        let bk = self.pool.acquire(Binding {
            key,
            value,
            hash,
            next,
        });
        self.buckets[bucket] = Some(bk);
        self.len += 1;
        bk
    }

    /// Unlink a located binding and return its payload; the shell is pooled.
    pub(crate) fn unlink(&mut self, found: Found) -> Binding<K, V> {
        let b = self
            .pool
            .release(found.at)
            .expect("located binding must be live");
        match found.prev {
            None => self.buckets[found.bucket] = b.next,
            Some(p) => {
                self.pool
                    .get_mut(p)
                    .expect("chain links must point at live bindings")
                    .next = b.next
            }
        }
        self.len -= 1;
        b
    }

    pub(crate) fn remove_found(&mut self, found: Found) -> (K, V) {
        self.mutations += 1;
        let b = self.unlink(found);
        self.compact_if_sparse();
        (b.key, b.value)
    }

    /// Rebuild the arena once removals have left it mostly empty, so arena
    /// walks stay proportional to the live entries. Invalidates every
    /// outstanding `BindingKey`.
    pub(crate) fn compact_if_sparse(&mut self) {
        if self.pool.is_sparse() {
            self.pool.compact(&mut self.buckets);
        }
    }

    // Rebuild every chain for `size` buckets from the cached hashes.
    fn relink(&mut self, size: usize) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        for idx in 0..self.buckets.len() {
            let mut cur = self.buckets[idx];
            while let Some(bk) = cur {
                scratch.push(bk);
                cur = self.binding(bk).next;
            }
        }
        self.buckets.clear();
        self.buckets.resize(size, None);
        for &bk in &scratch {
            let b = self
                .pool
                .get_mut(bk)
                .expect("chain links must point at live bindings");
            let idx = (b.hash % size as u64) as usize;
            b.next = self.buckets[idx];
            self.buckets[idx] = Some(bk);
        }
        scratch.clear();
        self.scratch = scratch;
        self.mutations += 1;
    }

    /// Grow once chains average eight bindings.
    pub(crate) fn grow_if_crowded(&mut self) {
        let eighths = self.len / 8;
        if eighths < self.buckets.len() {
            return;
        }
        match primes::covering_prime(eighths.saturating_mul(6)) {
            Some(size) if size > self.buckets.len() => self.resize_exact(size),
            _ => {
                #[cfg(feature = "logging")]
                log::warn!(
                    "table at {} buckets cannot grow further ({} entries)",
                    self.buckets.len(),
                    self.len
                );
            }
        }
    }
}

impl<K, V, H: KeyStrategy<K>> Table<K, V, H> {
    /// Insert or overwrite. Returns the previous value for an existing key.
    ///
    /// On overwrite the stored key is kept and `key` is dropped, unless a
    /// key destructor is configured: then the stored key is destroyed and
    /// replaced by `key`.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.mutations += 1;
        let hash = self.strategy.hash_key(&key);
        let found = self.locate_by(hash, |k| self.strategy.eq_keys(k, &key));
        match found {
            Some(found) => {
                let replace_key = self.destructors.has_key_destructor();
                let b = self
                    .pool
                    .get_mut(found.at)
                    .expect("located binding must be live");
                let old = std::mem::replace(&mut b.value, value);
                if replace_key {
                    let old_key = std::mem::replace(&mut b.key, key);
                    self.destructors.destroy_key(old_key);
                }
                Some(old)
            }
            None => {
                self.grow_if_crowded();
                let bucket = self.bucket_of(hash);
                self.link(bucket, key, value, hash);
                None
            }
        }
    }

    /// Insert or overwrite, destroying any displaced key and value with the
    /// table's destructors. Returns whether the key was already present.
    pub fn put_clean(&mut self, key: K, value: V) -> bool {
        self.put_clean_with(key, value, None, None)
    }

    /// Like [`put_clean`](Self::put_clean), with per-call destructors
    /// overriding the table's.
    pub fn put_clean_with(
        &mut self,
        key: K,
        value: V,
        key_destroy: Option<&mut dyn FnMut(K)>,
        value_destroy: Option<&mut dyn FnMut(V)>,
    ) -> bool {
        self.mutations += 1;
        let hash = self.strategy.hash_key(&key);
        let found = self.locate_by(hash, |k| self.strategy.eq_keys(k, &key));
        match found {
            Some(found) => {
                let b = self
                    .pool
                    .get_mut(found.at)
                    .expect("located binding must be live");
                let old_key = std::mem::replace(&mut b.key, key);
                let old_value = std::mem::replace(&mut b.value, value);
                match key_destroy {
                    Some(f) => f(old_key),
                    None => self.destructors.destroy_key(old_key),
                }
                match value_destroy {
                    Some(f) => f(old_value),
                    None => self.destructors.destroy_value(old_value),
                }
                true
            }
            None => {
                self.grow_if_crowded();
                let bucket = self.bucket_of(hash);
                self.link(bucket, key, value, hash);
                false
            }
        }
    }

    /// Switch to a new strategy and relink every entry under it. Keys that
    /// become equal collapse to one entry; the others are destroyed and
    /// counted in the return value.
    pub fn set_strategy(&mut self, strategy: H) -> usize {
        self.strategy = strategy;
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        for idx in 0..self.buckets.len() {
            let mut cur = self.buckets[idx].take();
            while let Some(bk) = cur {
                cur = self.binding(bk).next;
                scratch.push(bk);
            }
        }
        self.len = 0;
        let mut collapsed = 0usize;
        for &bk in &scratch {
            let hash = self.strategy.hash_key(&self.binding(bk).key);
            let dup = {
                let key = &self.binding(bk).key;
                self.locate_by(hash, |k| self.strategy.eq_keys(k, key))
                    .is_some()
            };
            if dup {
                let b = self
                    .pool
                    .release(bk)
                    .expect("relinked binding must be live");
                self.destructors.destroy(b.key, b.value);
                collapsed += 1;
            } else {
                let bucket = self.bucket_of(hash);
                let b = self
                    .pool
                    .get_mut(bk)
                    .expect("relinked binding must be live");
                b.hash = hash;
                b.next = self.buckets[bucket];
                self.buckets[bucket] = Some(bk);
                self.len += 1;
            }
        }
        scratch.clear();
        self.scratch = scratch;
        self.mutations += 1;
        #[cfg(feature = "logging")]
        log::debug!(
            "rehashed {} entries under a new strategy ({} collapsed)",
            self.len,
            collapsed
        );
        collapsed
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut reachable = 0;
        for idx in 0..self.buckets.len() {
            for b in self.chain(idx) {
                assert_eq!(b.hash, self.strategy.hash_key(&b.key), "stale cached hash");
                assert_eq!(self.bucket_of(b.hash), idx, "binding in wrong bucket");
                reachable += 1;
            }
        }
        assert_eq!(reachable, self.len, "len must match reachable bindings");
        assert_eq!(self.iter().count(), self.len);
        assert_eq!(self.pool.live(), self.len, "arena must hold only chained bindings");
    }
}

/// Bindings of one chain, head first.
pub(crate) struct Chain<'a, K, V> {
    pool: &'a EntryPool<K, V>,
    cur: Option<BindingKey>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = &'a Binding<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let b = self
            .pool
            .get(self.cur?)
            .expect("chain links must point at live bindings");
        self.cur = b.next;
        Some(b)
    }
}

impl<K, V, H: KeyStrategy<K>> Extend<(K, V)> for Table<K, V, H> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<'a, K, V, H> IntoIterator for &'a Table<K, V, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for Table<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
