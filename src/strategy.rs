//! Key strategies: how a table hashes and compares its keys.
//!
//! A strategy is the (hash, equality) pair a table places keys with. The
//! bucket of a key is `hash_key(key) % size`; two keys are the same entry
//! iff `eq_keys` says so. Strategies must be consistent: equal keys hash
//! equally.
//!
//! Merges compare two tables bucket by bucket, which is only sound when
//! both tables place keys identically. `same_layout` reports that; when it
//! is false the merge engine falls back to classifying the second table's
//! keys under the first table's strategy.

use core::hash::{BuildHasher, Hash, Hasher};
use hashbrown::hash_map::DefaultHashBuilder;
use std::collections::hash_map::DefaultHasher;

pub trait KeyStrategy<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;

    fn eq_keys(&self, a: &K, b: &K) -> bool;

    /// True when `other` hashes and compares every key exactly as `self`.
    fn same_layout(&self, _other: &Self) -> bool
    where
        Self: Sized,
    {
        false
    }
}

/// `Hash + Eq` keys hashed with a fixed-key SipHash, so every table using
/// `Exact` places a given key in the same bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exact;

impl<K: Hash + Eq + ?Sized> KeyStrategy<K> for Exact {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        h.finish()
    }

    #[inline]
    fn eq_keys(&self, a: &K, b: &K) -> bool {
        a == b
    }

    fn same_layout(&self, _other: &Self) -> bool {
        true
    }
}

/// Byte-like keys compared with ASCII case folding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsciiCaseless;

impl<K: AsRef<[u8]> + ?Sized> KeyStrategy<K> for AsciiCaseless {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        fnv1a(key.as_ref(), true)
    }

    #[inline]
    fn eq_keys(&self, a: &K, b: &K) -> bool {
        a.as_ref().eq_ignore_ascii_case(b.as_ref())
    }

    fn same_layout(&self, _other: &Self) -> bool {
        true
    }
}

/// `Hash + Eq` keys hashed with an arbitrary `BuildHasher`.
///
/// Hasher state is not comparable, so two `WithHasher` tables are never
/// assumed to share a layout and merges between them take the fallback
/// path.
#[derive(Debug, Clone, Default)]
pub struct WithHasher<S = DefaultHashBuilder>(pub S);

impl<K, S> KeyStrategy<K> for WithHasher<S>
where
    K: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.0.hash_one(key)
    }

    #[inline]
    fn eq_keys(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a, optionally over the ASCII-lowercased bytes.
pub(crate) fn fnv1a(bytes: &[u8], fold_case: bool) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |h, &b| {
        let b = if fold_case { b.to_ascii_lowercase() } else { b };
        (h ^ b as u64).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_is_deterministic_across_instances() {
        let a = Exact;
        let b = Exact;
        assert_eq!(
            KeyStrategy::<str>::hash_key(&a, "key"),
            KeyStrategy::<str>::hash_key(&b, "key")
        );
        assert!(KeyStrategy::<str>::same_layout(&a, &b));
    }

    #[test]
    fn borrowed_and_owned_hash_alike() {
        let owned = String::from("hello");
        assert_eq!(
            KeyStrategy::<String>::hash_key(&Exact, &owned),
            KeyStrategy::<str>::hash_key(&Exact, "hello")
        );
        assert_eq!(
            KeyStrategy::<String>::hash_key(&AsciiCaseless, &owned),
            KeyStrategy::<str>::hash_key(&AsciiCaseless, "hello")
        );
    }

    #[test]
    fn caseless_folds_ascii_only() {
        let s = AsciiCaseless;
        assert!(KeyStrategy::<str>::eq_keys(&s, "Hello", "hELLO"));
        assert_eq!(
            KeyStrategy::<str>::hash_key(&s, "Hello"),
            KeyStrategy::<str>::hash_key(&s, "hELLO")
        );
        assert!(!KeyStrategy::<str>::eq_keys(&s, "straße", "STRASSE"));
    }

    #[test]
    fn with_hasher_never_claims_shared_layout() {
        let a: WithHasher = WithHasher::default();
        let b: WithHasher = WithHasher::default();
        assert!(!KeyStrategy::<u32>::same_layout(&a, &b));
        assert!(KeyStrategy::<u32>::eq_keys(&a, &7, &7));
    }

    #[test]
    fn fnv_matches_reference_vectors() {
        assert_eq!(fnv1a(b"", false), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a", false), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a(b"A", true), fnv1a(b"a", false));
    }
}
