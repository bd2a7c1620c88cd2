//! chain-table: a single-threaded hash table of separately chained buckets
//! with prime bucket counts, pluggable key strategies, pooled entry nodes
//! and destructive set-algebra merges.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a table engine whose placement rules, node recycling and merge
//!   algorithms can each be reasoned about on their own.
//! - Layers:
//!   - EntryPool<K, V>: slotmap arena of boxed chain nodes plus a bounded
//!     list of empty node shells for reuse. The arena is rebuilt at the
//!     live size once removals leave it mostly empty.
//!   - Table<K, V, H>: bucket array of chain heads over the pool; `H` is a
//!     `KeyStrategy` supplying hash and equality.
//!   - Merge engine: AND / OR / XOR / NOT between two tables, bucket by
//!     bucket when their strategies share a layout.
//!   - DynTable<V>: a table whose key kind is picked at runtime, with typed
//!     and loosely-typed entry points.
//!
//! Constraints
//! - Single-threaded: destructor hooks are `Box<dyn FnMut>`, so tables are
//!   `!Send`/`!Sync`. Share one with `SharedTable` (`Rc<RefCell<_>>`).
//! - Bucket counts come from a fixed table of primes; `resize_exact` is the
//!   only way around it.
//! - At most one live entry per key under the table's strategy.
//!
//! Sizing
//! - A table built for `n` entries starts with the smallest prime above
//!   `n / 4` buckets. Inserting a new key when `len / 8 >= size` first
//!   grows the table to the smallest prime above `6 * (len / 8)`.
//!
//! Hashing invariants
//! - Each node stores the hash it was linked with. Resizes and aligned
//!   merges index by the stored hash and never call the strategy.
//!   `set_strategy` is the only operation that rehashes.
//!
//! Disposal
//! - Keys and values leaving a table through overwrite, removal, a
//!   destroying clear or a merge go to the table's destructors when set,
//!   and are dropped otherwise. Dropping a table drops its entries without
//!   running the hooks.
//!
//! Mutation and iteration
//! - Every structural operation bumps `mutation_count()`. Iterators borrow
//!   the table, so changing membership mid-iteration does not compile.

mod builder;
mod dispose;
mod dyn_table;
mod error;
pub mod iter;
mod kind;
mod merge;
mod pool;
mod primes;
mod strategy;
mod table;
mod table_proptest;

// Public surface
pub use builder::TableBuilder;
pub use dispose::{Destructors, KeyDestructor, ValueDestructor};
pub use dyn_table::DynTable;
pub use error::TableError;
pub use kind::{Key, KeyKind, KeyRef, KindStrategy};
pub use merge::MergeOp;
pub use pool::{PoolConfig, PoolStats};
pub use primes::{covering_prime, size_for_entries, MAX_SIZE};
pub use strategy::{AsciiCaseless, Exact, KeyStrategy, WithHasher};
pub use table::{SharedTable, Table};
