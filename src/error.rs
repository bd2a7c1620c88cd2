use crate::kind::KeyKind;

/// Errors reported by table construction, resizing and the key-kind
/// façade.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// A key of one representation was used against a table configured for
    /// another (e.g. an integer lookup on a byte-string table).
    #[error("key kind mismatch: table holds {expected} keys but got a {found} key")]
    KeyKindMismatch { expected: KeyKind, found: KeyKind },

    /// An integer key does not fit the width of the table's key kind.
    #[error("integer key {value} does not fit a {kind} table")]
    KeyOutOfRange { kind: KeyKind, value: i64 },

    /// The requested size is beyond the largest supported bucket count.
    #[error("requested size {requested} exceeds the largest supported bucket count")]
    CapacityExceeded { requested: usize },
}
