use crate::dispose::{Destructors, KeyDestructor, ValueDestructor};
use crate::error::TableError;
use crate::pool::PoolConfig;
use crate::strategy::Exact;
use crate::table::Table;

/// Builds a [`Table`] with various configuration knobs.
///
/// # Examples
///
/// ```rust
/// use chain_table::{PoolConfig, Table};
///
/// let mut table = Table::builder()
///     // Expect about 10,000 entries: start with 4,093 buckets.
///     .expected_len(10_000)
///     // Keep at most 4,096 recycled node shells.
///     .pool_config(PoolConfig::new(256, 4096))
///     // Observe every value the table discards.
///     .value_destructor(|v: String| println!("dropping {v}"))
///     .build()
///     .expect("10,000 entries fit the prime table");
///
/// table.put(1u64, "one".to_string());
/// table.put(1u64, "uno".to_string());
/// assert_eq!(table.fetch(&1), Some(&"uno".to_string()));
/// ```
pub struct TableBuilder<K, V, H = Exact> {
    expected_len: usize,
    strategy: H,
    pool: PoolConfig,
    key_destructor: Option<KeyDestructor<K>>,
    value_destructor: Option<ValueDestructor<V>>,
}

impl<K, V> TableBuilder<K, V, Exact> {
    pub fn new() -> Self {
        Self {
            expected_len: 0,
            strategy: Exact,
            pool: PoolConfig::default(),
            key_destructor: None,
            value_destructor: None,
        }
    }
}

impl<K, V> Default for TableBuilder<K, V, Exact> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H> TableBuilder<K, V, H> {
    /// Size the bucket array for about `n` entries.
    pub fn expected_len(self, n: usize) -> Self {
        Self {
            expected_len: n,
            ..self
        }
    }

    /// Place keys with `strategy` instead of the current one.
    pub fn strategy<H2>(self, strategy: H2) -> TableBuilder<K, V, H2> {
        TableBuilder {
            expected_len: self.expected_len,
            strategy,
            pool: self.pool,
            key_destructor: self.key_destructor,
            value_destructor: self.value_destructor,
        }
    }

    pub fn pool_config(self, pool: PoolConfig) -> Self {
        Self { pool, ..self }
    }

    /// Run `f` on every key the table discards. Also makes overwrites
    /// replace the stored key.
    pub fn key_destructor(self, f: impl FnMut(K) + 'static) -> Self {
        Self {
            key_destructor: Some(Box::new(f)),
            ..self
        }
    }

    /// Run `f` on every value the table discards.
    pub fn value_destructor(self, f: impl FnMut(V) + 'static) -> Self {
        Self {
            value_destructor: Some(Box::new(f)),
            ..self
        }
    }

    /// Fails with `CapacityExceeded` when `expected_len / 4` is beyond the
    /// prime table.
    pub fn build(self) -> Result<Table<K, V, H>, TableError> {
        Table::with_parts(
            self.expected_len,
            self.strategy,
            Destructors::new(self.key_destructor, self.value_destructor),
            self.pool,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::AsciiCaseless;

    #[test]
    fn defaults() {
        let t: Table<u32, u32> = TableBuilder::new().build().unwrap();
        assert_eq!(t.size(), 3);
        assert_eq!(t.pool_config(), PoolConfig::default());
    }

    #[test]
    fn knobs_are_applied() {
        let t: Table<String, u32, AsciiCaseless> = TableBuilder::new()
            .expected_len(1000)
            .pool_config(PoolConfig::disabled())
            .strategy(AsciiCaseless)
            .build()
            .unwrap();
        assert_eq!(t.size(), 251);
        assert_eq!(t.pool_config().max_capacity, 0);
    }

    #[test]
    fn oversized_expectation_is_rejected() {
        let r = TableBuilder::<u8, u8>::new().expected_len(usize::MAX).build();
        assert!(matches!(r, Err(TableError::CapacityExceeded { .. })));
    }
}
