//! `DynTable`: a table whose key kind is chosen at runtime.
//!
//! Typed entry points take a [`Key`] or [`KeyRef`] and reject keys whose
//! representation does not match the table's [`KeyKind`]. The loose entry
//! points take plain text or an `i64` and convert it to whatever the table
//! holds: text becomes a byte-string or string key, integers are narrowed
//! to the table's width.

use crate::dispose::{Destructors, KeyDestructor, ValueDestructor};
use crate::error::TableError;
use crate::iter::{Drain, Iter, IterMut};
use crate::kind::{Key, KeyKind, KeyRef, KindStrategy};
use crate::merge::MergeOp;
use crate::pool::{PoolConfig, PoolStats};
use crate::primes;
use crate::table::{Found, Table};
use std::fmt;

pub struct DynTable<V> {
    inner: Table<Key, V, KindStrategy>,
}

impl<V> DynTable<V> {
    /// An empty table of `kind` with the smallest bucket count.
    pub fn new(kind: KeyKind) -> Self {
        Self {
            inner: Table::from_parts(
                primes::PRIMES[0],
                KindStrategy::new(kind),
                Destructors::none(),
                PoolConfig::default(),
            ),
        }
    }

    pub fn with_expected_len(kind: KeyKind, expected: usize) -> Result<Self, TableError> {
        Table::with_strategy(expected, KindStrategy::new(kind)).map(Self::from_table)
    }

    /// Wrap a table built elsewhere, e.g. with destructors from
    /// [`TableBuilder`](crate::TableBuilder).
    pub fn from_table(inner: Table<Key, V, KindStrategy>) -> Self {
        Self { inner }
    }

    pub fn bytes() -> Self {
        Self::new(KeyKind::Bytes)
    }

    pub fn bytes_nocase() -> Self {
        Self::new(KeyKind::BytesNoCase)
    }

    pub fn strings() -> Self {
        Self::new(KeyKind::Str)
    }

    pub fn strings_nocase() -> Self {
        Self::new(KeyKind::StrNoCase)
    }

    pub fn i32() -> Self {
        Self::new(KeyKind::I32)
    }

    pub fn u32() -> Self {
        Self::new(KeyKind::U32)
    }

    pub fn i64() -> Self {
        Self::new(KeyKind::I64)
    }

    pub fn u64() -> Self {
        Self::new(KeyKind::U64)
    }

    pub fn kind(&self) -> KeyKind {
        self.inner.strategy().kind()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_table(&self) -> &Table<Key, V, KindStrategy> {
        &self.inner
    }

    pub fn into_table(self) -> Table<Key, V, KindStrategy> {
        self.inner
    }

    pub fn iter(&self) -> Iter<'_, Key, V> {
        self.inner.iter()
    }

    pub fn set_destructors(
        &mut self,
        key: Option<KeyDestructor<Key>>,
        value: Option<ValueDestructor<V>>,
    ) {
        self.inner.set_destructors(key, value);
    }

    pub fn destructors(&self) -> &Destructors<Key, V> {
        self.inner.destructors()
    }

    pub fn clear(&mut self, destroy: bool) {
        self.inner.clear(destroy);
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, Key, V> {
        self.inner.iter_mut()
    }

    pub fn for_each(&self, f: impl FnMut(&Key, &V)) {
        self.inner.for_each(f);
    }

    pub fn for_each_mut(&mut self, f: impl FnMut(&Key, &mut V)) {
        self.inner.for_each_mut(f);
    }

    pub fn drain(&mut self) -> Drain<'_, Key, V, KindStrategy> {
        self.inner.drain()
    }

    pub fn drain_with(&mut self, f: impl FnMut(Key, V)) {
        self.inner.drain_with(f);
    }

    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn resize(&mut self, size_hint: usize) -> Result<(), TableError> {
        self.inner.resize(size_hint)
    }

    pub fn resize_for(&mut self, entries: usize) -> Result<(), TableError> {
        self.inner.resize_for(entries)
    }

    pub fn resize_exact(&mut self, size: usize) {
        self.inner.resize_exact(size);
    }

    pub fn mutation_count(&self) -> u64 {
        self.inner.mutation_count()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool_stats()
    }

    pub fn release_pool(&mut self) {
        self.inner.release_pool();
    }

    fn check(&self, key: KeyRef<'_>) -> Result<(), TableError> {
        let kind = self.kind();
        if kind.accepts(key) {
            Ok(())
        } else {
            Err(TableError::KeyKindMismatch {
                expected: kind,
                found: key.kind(),
            })
        }
    }

    fn locate(&self, key: KeyRef<'_>) -> Option<Found> {
        let strategy = *self.inner.strategy();
        let hash = strategy.hash_ref(key);
        self.inner
            .locate_by(hash, |k| strategy.eq_refs(k.as_key_ref(), key))
    }

    pub fn put(&mut self, key: impl Into<Key>, value: V) -> Result<Option<V>, TableError> {
        let key = key.into();
        self.check(key.as_key_ref())?;
        Ok(self.inner.put(key, value))
    }

    pub fn put_clean(&mut self, key: impl Into<Key>, value: V) -> Result<bool, TableError> {
        let key = key.into();
        self.check(key.as_key_ref())?;
        Ok(self.inner.put_clean(key, value))
    }

    /// `put_clean` with one-off destructors for the displaced key and
    /// value, used instead of the table's own.
    pub fn put_clean_with(
        &mut self,
        key: impl Into<Key>,
        value: V,
        key_destroy: Option<&mut dyn FnMut(Key)>,
        value_destroy: Option<&mut dyn FnMut(V)>,
    ) -> Result<bool, TableError> {
        let key = key.into();
        self.check(key.as_key_ref())?;
        Ok(self.inner.put_clean_with(key, value, key_destroy, value_destroy))
    }

    pub fn fetch<'k>(&self, key: impl Into<KeyRef<'k>>) -> Result<Option<&V>, TableError> {
        let key = key.into();
        self.check(key)?;
        Ok(self.locate(key).map(|f| &self.inner.binding(f.at).value))
    }

    pub fn fetch_mut<'k>(
        &mut self,
        key: impl Into<KeyRef<'k>>,
    ) -> Result<Option<&mut V>, TableError> {
        let key = key.into();
        self.check(key)?;
        Ok(match self.locate(key) {
            Some(f) => self.inner.pool.get_mut(f.at).map(|b| &mut b.value),
            None => None,
        })
    }

    pub fn contains_key<'k>(&self, key: impl Into<KeyRef<'k>>) -> Result<bool, TableError> {
        let key = key.into();
        self.check(key)?;
        Ok(self.locate(key).is_some())
    }

    /// Remove `key`, destroying the stored key and returning the value.
    pub fn remove<'k>(&mut self, key: impl Into<KeyRef<'k>>) -> Result<Option<V>, TableError> {
        Ok(self.remove_entry(key)?.map(|(k, v)| {
            self.inner.destructors.destroy_key(k);
            v
        }))
    }

    pub fn remove_entry<'k>(
        &mut self,
        key: impl Into<KeyRef<'k>>,
    ) -> Result<Option<(Key, V)>, TableError> {
        let key = key.into();
        self.check(key)?;
        Ok(self.locate(key).map(|f| self.inner.remove_found(f)))
    }

    // Text as the key the table holds: bytes for byte kinds, a string
    // otherwise. Integer tables reject text.
    fn text_ref<'t>(&self, text: &'t str) -> Result<KeyRef<'t>, TableError> {
        match self.kind() {
            KeyKind::Bytes | KeyKind::BytesNoCase => Ok(KeyRef::Bytes(text.as_bytes())),
            KeyKind::Str | KeyKind::StrNoCase => Ok(KeyRef::Str(text)),
            kind => Err(TableError::KeyKindMismatch {
                expected: kind,
                found: KeyKind::Str,
            }),
        }
    }

    // `Ok(None)` when the value does not fit the table's width.
    fn int_ref(&self, value: i64) -> Result<Option<KeyRef<'static>>, TableError> {
        let kind = self.kind();
        if !kind.is_integer() {
            return Err(TableError::KeyKindMismatch {
                expected: kind,
                found: KeyKind::I64,
            });
        }
        Ok(kind.narrow(value))
    }

    pub fn put_text(&mut self, text: &str, value: V) -> Result<Option<V>, TableError> {
        let key = self.text_ref(text)?.to_key();
        Ok(self.inner.put(key, value))
    }

    pub fn fetch_text(&self, text: &str) -> Result<Option<&V>, TableError> {
        let key = self.text_ref(text)?;
        Ok(self.locate(key).map(|f| &self.inner.binding(f.at).value))
    }

    pub fn contains_text(&self, text: &str) -> Result<bool, TableError> {
        let key = self.text_ref(text)?;
        Ok(self.locate(key).is_some())
    }

    pub fn remove_text(&mut self, text: &str) -> Result<Option<V>, TableError> {
        let key = self.text_ref(text)?;
        self.remove(key)
    }

    /// Fails with `KeyOutOfRange` when `value` does not fit the table's
    /// integer width.
    pub fn put_int(&mut self, value: i64, v: V) -> Result<Option<V>, TableError> {
        let key = self.int_ref(value)?.ok_or(TableError::KeyOutOfRange {
            kind: self.kind(),
            value,
        })?;
        Ok(self.inner.put(key.to_key(), v))
    }

    /// Integers outside the table's width are simply absent.
    pub fn fetch_int(&self, value: i64) -> Result<Option<&V>, TableError> {
        Ok(match self.int_ref(value)? {
            Some(key) => self.locate(key).map(|f| &self.inner.binding(f.at).value),
            None => None,
        })
    }

    pub fn contains_int(&self, value: i64) -> Result<bool, TableError> {
        Ok(match self.int_ref(value)? {
            Some(key) => self.locate(key).is_some(),
            None => false,
        })
    }

    pub fn remove_int(&mut self, value: i64) -> Result<Option<V>, TableError> {
        match self.int_ref(value)? {
            Some(key) => self.remove(key),
            None => Ok(None),
        }
    }

    /// Switch to another kind with the same key representation (e.g.
    /// `Bytes` to `BytesNoCase`) and rehash every entry. Returns how many
    /// entries collapsed into others under the new comparison.
    pub fn set_key_kind(&mut self, kind: KeyKind) -> Result<usize, TableError> {
        let current = self.kind();
        if !current.same_representation(kind) {
            return Err(TableError::KeyKindMismatch {
                expected: current,
                found: kind,
            });
        }
        if current == kind {
            return Ok(0);
        }
        Ok(self.inner.set_strategy(KindStrategy::new(kind)))
    }

    /// Merge `other` into `self`. Both tables must share a key
    /// representation; when their kinds differ, `self`'s comparison rules
    /// apply.
    pub fn merge(&mut self, other: DynTable<V>, op: MergeOp) -> Result<(), TableError> {
        let (ours, theirs) = (self.kind(), other.kind());
        if !ours.same_representation(theirs) {
            return Err(TableError::KeyKindMismatch {
                expected: ours,
                found: theirs,
            });
        }
        self.inner.merge(other.inner, op);
        Ok(())
    }
}

impl<V: fmt::Debug> fmt::Debug for DynTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynTable")
            .field("kind", &self.kind())
            .field("entries", &self.inner)
            .finish()
    }
}
