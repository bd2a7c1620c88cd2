//! Prime bucket counts.
//!
//! Each entry is the largest prime below a power of two, from 2^2 up to
//! 2^31. Bucket arrays are sized from this table so that `hash % size`
//! spreads keys well even when the hash itself is weak (small integers).

pub(crate) const PRIMES: [usize; 30] = [
    3,
    7,
    13,
    31,
    61,
    127,
    251,
    509,
    1021,
    2039,
    4093,
    8191,
    16381,
    32749,
    65521,
    131071,
    262139,
    524287,
    1048573,
    2097143,
    4194301,
    8388593,
    16777213,
    33554393,
    67108859,
    134217689,
    268435399,
    536870909,
    1073741789,
    2147483647,
];

/// Largest bucket count the prime table can cover.
pub const MAX_SIZE: usize = PRIMES[PRIMES.len() - 1];

/// Smallest prime in the table strictly greater than `hint`, or `None`
/// when `hint` is at or beyond [`MAX_SIZE`].
pub fn covering_prime(hint: usize) -> Option<usize> {
    let i = PRIMES.partition_point(|&p| p <= hint);
    PRIMES.get(i).copied()
}

/// Bucket count for a table expected to hold `entries` entries
/// (a load factor of roughly four).
pub fn size_for_entries(entries: usize) -> Option<usize> {
    covering_prime(entries / 4)
}
