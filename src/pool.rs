//! Entry pool: recycles binding nodes for one table.
//!
//! Every binding lives in its own heap node, and the nodes of live
//! bindings are indexed by a `SlotMap` arena of generational `BindingKey`s.
//! Releasing a binding takes its node out of the arena and moves the
//! payload out, leaving an empty shell. The shell is kept for the next
//! insertion until the pool's retention capacity is reached; past that it
//! is deallocated on the spot.
//!
//! Retention capacity grows lazily: nothing is retained until the first
//! release, then `initial_capacity` shells, doubling on demand up to
//! `max_capacity`.
//!
//! The arena itself only holds node pointers, but its slot vector keeps
//! the high-water mark of live bindings. `compact` rebuilds it at the live
//! size, remapping chain links; `shrink` also frees every retained shell.

use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Generational address of a binding inside its table's arena.
    pub struct BindingKey;
}

/// One key/value node of a bucket chain.
#[derive(Debug)]
pub(crate) struct Binding<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Hash under the strategy active when the binding was (re)linked.
    pub(crate) hash: u64,
    pub(crate) next: Option<BindingKey>,
}

/// Heap node; `None` marks a pooled shell.
pub(crate) type Node<K, V> = Box<Option<Binding<K, V>>>;

/// Retention limits for a table's entry pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Shells retained after the first release.
    pub initial_capacity: usize,
    /// Hard cap on retained shells; capacity doubles until it reaches this.
    pub max_capacity: usize,
}

impl PoolConfig {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;
    pub const DEFAULT_MAX_CAPACITY: usize = 65536;

    /// `initial_capacity` is clamped to `max_capacity`.
    pub fn new(initial_capacity: usize, max_capacity: usize) -> Self {
        Self {
            initial_capacity: initial_capacity.min(max_capacity),
            max_capacity,
        }
    }

    /// A pool that never retains shells; every release frees its node.
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY, Self::DEFAULT_MAX_CAPACITY)
    }
}

/// Counters describing pool usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Shells currently retained.
    pub pooled: usize,
    /// Current retention capacity.
    pub capacity: usize,
    /// Acquisitions served from a retained shell.
    pub hits: u64,
    /// Acquisitions that needed a fresh node.
    pub misses: u64,
    /// Shells deallocated, either past the cap or by `shrink`.
    pub freed: u64,
    /// Slots the arena currently has room for.
    pub arena_capacity: usize,
}

#[derive(Debug)]
pub(crate) struct EntryPool<K, V> {
    slots: SlotMap<BindingKey, Node<K, V>>,
    shells: Vec<Node<K, V>>,
    capacity: usize,
    config: PoolConfig,
    stats: PoolStats,
}

impl<K, V> EntryPool<K, V> {
    const COMPACT_MIN_SLOTS: usize = 64;

    pub(crate) fn new(config: PoolConfig) -> Self {
        Self {
            slots: SlotMap::with_key(),
            shells: Vec::new(),
            capacity: 0,
            config,
            stats: PoolStats::default(),
        }
    }

    pub(crate) fn config(&self) -> PoolConfig {
        self.config
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            pooled: self.shells.len(),
            capacity: self.capacity,
            arena_capacity: self.slots.capacity(),
            ..self.stats
        }
    }

    /// Store `binding`, reusing a retained shell when one is available.
    pub(crate) fn acquire(&mut self, binding: Binding<K, V>) -> BindingKey {
        let node = match self.shells.pop() {
            Some(mut shell) => {
                self.stats.hits += 1;
                debug_assert!(shell.is_none());
                *shell = Some(binding);
                shell
            }
            None => {
                self.stats.misses += 1;
                Box::new(Some(binding))
            }
        };
        self.slots.insert(node)
    }

    /// Move the payload out of `k` and retain or free its shell.
    pub(crate) fn release(&mut self, k: BindingKey) -> Option<Binding<K, V>> {
        let mut node = self.slots.remove(k)?;
        let binding = node.take()?;
        if self.reserve_one() {
            self.shells.push(node);
        } else {
            drop(node);
            self.stats.freed += 1;
        }
        Some(binding)
    }

    // Make room for one more retained shell, growing capacity if allowed.
    fn reserve_one(&mut self) -> bool {
        if self.shells.len() < self.capacity {
            return true;
        }
        if self.capacity >= self.config.max_capacity {
            return false;
        }
        let grown = if self.capacity == 0 {
            self.config.initial_capacity.max(1)
        } else {
            self.capacity.saturating_mul(2)
        };
        self.capacity = grown.min(self.config.max_capacity);
        self.shells.len() < self.capacity
    }

    /// Free every retained shell, then `compact`.
    pub(crate) fn shrink(&mut self, heads: &mut [Option<BindingKey>]) {
        let n = self.shells.len();
        self.shells = Vec::new();
        self.stats.freed += n as u64;
        self.compact(heads);
        #[cfg(feature = "logging")]
        log::trace!("entry pool freed {n} shells");
    }

    /// True once the arena has room for four times its live bindings.
    pub(crate) fn is_sparse(&self) -> bool {
        let room = self.slots.capacity();
        room >= Self::COMPACT_MIN_SLOTS && room / 4 > self.slots.len()
    }

    /// Rebuild the arena at its live size. Chain links inside the pool and
    /// the chain `heads` are rewritten to the new keys; retained shells
    /// are kept.
    pub(crate) fn compact(&mut self, heads: &mut [Option<BindingKey>]) {
        let live = self.slots.len();
        let old = std::mem::replace(&mut self.slots, SlotMap::with_capacity_and_key(live));
        let mut remap: SecondaryMap<BindingKey, BindingKey> = SecondaryMap::with_capacity(live);
        for (k, node) in old {
            remap.insert(k, self.slots.insert(node));
        }
        let moved = |k: BindingKey| {
            *remap
                .get(k)
                .expect("chain links must point at live bindings")
        };
        for (_, node) in self.slots.iter_mut() {
            if let Some(b) = (**node).as_mut() {
                b.next = b.next.map(moved);
            }
        }
        for head in heads.iter_mut() {
            *head = head.map(moved);
        }
    }

    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, k: BindingKey) -> Option<&Binding<K, V>> {
        self.slots.get(k).and_then(|node| (**node).as_ref())
    }

    pub(crate) fn get_mut(&mut self, k: BindingKey) -> Option<&mut Binding<K, V>> {
        self.slots.get_mut(k).and_then(|node| (**node).as_mut())
    }

    pub(crate) fn nodes_mut(&mut self) -> slotmap::basic::IterMut<'_, BindingKey, Node<K, V>> {
        self.slots.iter_mut()
    }
}
