//! Set-algebra merges: AND / OR / XOR / NOT over two tables' key sets.
//!
//! Every merge consumes its second table. Entries that do not survive are
//! destroyed with the destructors of the table they came from; entries of
//! the second table that survive are moved into the first.
//!
//! When both strategies share a layout, the smaller table is resized to
//! the larger bucket count so that a key lands at the same index in both;
//! the merge then compares the two chains of each bucket pairwise. When
//! layouts differ, the second table's keys are rehashed under the first
//! table's strategy and looked up in its chains instead. Key equality is
//! always the first table's.

use crate::pool::{Binding, BindingKey};
use crate::strategy::KeyStrategy;
use crate::table::{Found, Table};
use core::cmp::Ordering;
use slotmap::SecondaryMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeOp {
    /// Keep keys present in both tables.
    And,
    /// Keep keys present in either table; the first table's value wins.
    Or,
    /// Keep keys present in exactly one table.
    Xor,
    /// Keep the first table's keys that are absent from the second.
    Not,
}

impl MergeOp {
    #[inline]
    fn keeps_ours(self, in_theirs: bool) -> bool {
        match self {
            MergeOp::And => in_theirs,
            MergeOp::Or => true,
            MergeOp::Xor | MergeOp::Not => !in_theirs,
        }
    }

    #[inline]
    fn adopts_theirs(self) -> bool {
        matches!(self, MergeOp::Or | MergeOp::Xor)
    }
}

impl<K, V, H: KeyStrategy<K>> Table<K, V, H> {
    /// Combine `other` into `self` under `op`, consuming `other`.
    pub fn merge(&mut self, other: Self, op: MergeOp) {
        self.bump();
        if self.strategy.same_layout(&other.strategy) {
            self.merge_aligned(other, op);
        } else {
            self.merge_cross(other, op);
        }
        self.compact_if_sparse();
        self.grow_if_crowded();
    }

    pub fn and(&mut self, other: Self) {
        self.merge(other, MergeOp::And)
    }

    pub fn or(&mut self, other: Self) {
        self.merge(other, MergeOp::Or)
    }

    pub fn xor(&mut self, other: Self) {
        self.merge(other, MergeOp::Xor)
    }

    pub fn not(&mut self, other: Self) {
        self.merge(other, MergeOp::Not)
    }
    fn merge_aligned(&mut self, mut other: Self, op: MergeOp) {
        match self.size().cmp(&other.size()) {
            Ordering::Less => self.resize_exact(other.size()),
            Ordering::Greater => other.resize_exact(self.size()),
            Ordering::Equal => {}
        }

        let mut incoming: Vec<Binding<K, V>> = Vec::new();
        for idx in 0..self.buckets.len() {
            let mut cur = other.buckets[idx].take();
            while let Some(bk) = cur {
                let b = other
                    .pool
                    .release(bk)
                    .expect("chain links must point at live bindings");
                cur = b.next;
                other.len -= 1;
                incoming.push(b);
            }

            let mut prev: Option<BindingKey> = None;
            let mut cur = self.buckets[idx];
            while let Some(bk) = cur {
                let (next, hit) = {
                    let ours = self.binding(bk);
                    let hit = incoming.iter().position(|theirs| {
                        theirs.hash == ours.hash && self.strategy.eq_keys(&ours.key, &theirs.key)
                    });
                    (ours.next, hit)
                };
                if let Some(i) = hit {
                    let dup = incoming.swap_remove(i);
                    other.destructors.destroy(dup.key, dup.value);
                }
                if op.keeps_ours(hit.is_some()) {
                    prev = Some(bk);
                } else {
                    let b = self.unlink(Found {
                        bucket: idx,
                        prev,
                        at: bk,
                    });
                    self.destructors.destroy(b.key, b.value);
                }
                cur = next;
            }

            for theirs in incoming.drain(..) {
                if op.adopts_theirs() {
                    self.link(idx, theirs.key, theirs.value, theirs.hash);
                } else {
                    other.destructors.destroy(theirs.key, theirs.value);
                }
            }
        }
        debug_assert!(other.is_empty());
    }

    fn merge_cross(&mut self, mut other: Self, op: MergeOp) {
        #[cfg(feature = "logging")]
        log::debug!(
            "merging {} entries across differing strategies ({:?})",
            other.len(),
            op
        );
        let theirs: Vec<(K, V)> = other.drain().collect();

        let mut matched: SecondaryMap<BindingKey, ()> = SecondaryMap::new();
        let mut adopted: Vec<(K, V, u64)> = Vec::new();
        for (key, value) in theirs {
            let hash = self.strategy.hash_key(&key);
            match self.locate_by(hash, |k| self.strategy.eq_keys(k, &key)) {
                Some(found) => {
                    matched.insert(found.at, ());
                    other.destructors.destroy(key, value);
                }
                None if op.adopts_theirs() => adopted.push((key, value, hash)),
                None => other.destructors.destroy(key, value),
            }
        }

        for idx in 0..self.buckets.len() {
            let mut prev: Option<BindingKey> = None;
            let mut cur = self.buckets[idx];
            while let Some(bk) = cur {
                let next = self.binding(bk).next;
                if op.keeps_ours(matched.contains_key(bk)) {
                    prev = Some(bk);
                } else {
                    let b = self.unlink(Found {
                        bucket: idx,
                        prev,
                        at: bk,
                    });
                    self.destructors.destroy(b.key, b.value);
                }
                cur = next;
            }
        }

        // Adopted keys equal under our strategy collapse to the first one.
        for (key, value, hash) in adopted {
            if self
                .locate_by(hash, |k| self.strategy.eq_keys(k, &key))
                .is_some()
            {
                other.destructors.destroy(key, value);
                continue;
            }
            self.grow_if_crowded();
            let bucket = self.bucket_of(hash);
            self.link(bucket, key, value, hash);
        }
    }
}
