//! Iterators over a `Table`.
//!
//! `Iter` and `Drain` walk the chains in bucket order. `IterMut` walks the
//! binding arena, which the table keeps compact, so its order is unrelated
//! to bucket order.

use crate::pool::{BindingKey, EntryPool, Node};
use crate::table::Table;
use core::iter::FusedIterator;

/// Iterator over immutable entries in `Table`.
pub struct Iter<'a, K, V> {
    pool: &'a EntryPool<K, V>,
    heads: core::slice::Iter<'a, Option<BindingKey>>,
    cur: Option<BindingKey>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(
        pool: &'a EntryPool<K, V>,
        heads: &'a [Option<BindingKey>],
        len: usize,
    ) -> Self {
        Self {
            pool,
            heads: heads.iter(),
            cur: None,
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(bk) = self.cur {
                let b = self
                    .pool
                    .get(bk)
                    .expect("chain links must point at live bindings");
                self.cur = b.next;
                self.remaining -= 1;
                return Some((&b.key, &b.value));
            }
            self.cur = *self.heads.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over entries in `Table` with mutable values.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, BindingKey, Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(pool: &'a mut EntryPool<K, V>, len: usize) -> Self {
        Self {
            it: pool.nodes_mut(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (_, node) = self.it.next()?;
        let b = (**node)
            .as_mut()
            .expect("arena nodes must hold live bindings");
        self.remaining -= 1;
        Some((&b.key, &mut b.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Draining iterator: each step detaches one entry and pools its shell.
/// Dropping it detaches whatever is left.
pub struct Drain<'a, K, V, H> {
    table: &'a mut Table<K, V, H>,
    bucket: usize,
}

impl<'a, K, V, H> Drain<'a, K, V, H> {
    pub(crate) fn new(table: &'a mut Table<K, V, H>) -> Self {
        Self { table, bucket: 0 }
    }
}

impl<K, V, H> Iterator for Drain<'_, K, V, H> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.bucket < self.table.buckets.len() {
            if let Some(bk) = self.table.buckets[self.bucket] {
                let b = self
                    .table
                    .pool
                    .release(bk)
                    .expect("chain links must point at live bindings");
                self.table.buckets[self.bucket] = b.next;
                self.table.len -= 1;
                return Some((b.key, b.value));
            }
            self.bucket += 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.len, Some(self.table.len))
    }
}

impl<K, V, H> ExactSizeIterator for Drain<'_, K, V, H> {}
impl<K, V, H> FusedIterator for Drain<'_, K, V, H> {}

impl<K, V, H> Drop for Drain<'_, K, V, H> {
    fn drop(&mut self) {
        self.for_each(drop);
        self.table.compact_if_sparse();
    }
}
