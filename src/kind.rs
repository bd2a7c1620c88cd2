//! Runtime key kinds.
//!
//! A `KeyKind` tags the representation and comparison rules of the keys a
//! [`DynTable`](crate::DynTable) holds. Byte-string and string kinds come in
//! case-sensitive and ASCII-case-insensitive flavours; integer kinds carry
//! their width and signedness. [`KindStrategy`] is the strategy a table uses
//! to place [`Key`]s of one kind.

use crate::strategy::{fnv1a, KeyStrategy};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Raw byte strings, compared exactly.
    Bytes,
    /// Raw byte strings, compared with ASCII case folding.
    BytesNoCase,
    /// UTF-8 strings, compared exactly.
    Str,
    /// UTF-8 strings, compared with ASCII case folding.
    StrNoCase,
    I32,
    U32,
    I64,
    U64,
}

impl KeyKind {
    pub const ALL: [KeyKind; 8] = [
        KeyKind::Bytes,
        KeyKind::BytesNoCase,
        KeyKind::Str,
        KeyKind::StrNoCase,
        KeyKind::I32,
        KeyKind::U32,
        KeyKind::I64,
        KeyKind::U64,
    ];

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            KeyKind::I32 | KeyKind::U32 | KeyKind::I64 | KeyKind::U64
        )
    }

    pub fn is_caseless(self) -> bool {
        matches!(self, KeyKind::BytesNoCase | KeyKind::StrNoCase)
    }

    /// The kind a key of this kind is naturally reported as when it shows
    /// up where it does not belong.
    fn representation(self) -> KeyKind {
        match self {
            KeyKind::BytesNoCase => KeyKind::Bytes,
            KeyKind::StrNoCase => KeyKind::Str,
            other => other,
        }
    }

    /// True when keys of `self` and `other` share an in-memory form, so a
    /// table can switch between them without converting keys.
    pub fn same_representation(self, other: KeyKind) -> bool {
        self.representation() == other.representation()
    }

    /// Whether `key` has the representation this kind stores.
    pub fn accepts(self, key: KeyRef<'_>) -> bool {
        self.representation() == key.kind()
    }

    /// Narrow a loosely-typed integer to this kind's width. `None` when
    /// the kind is not an integer kind or the value does not fit.
    pub fn narrow(self, value: i64) -> Option<KeyRef<'static>> {
        match self {
            KeyKind::I32 => i32::try_from(value).ok().map(KeyRef::I32),
            KeyKind::U32 => u32::try_from(value).ok().map(KeyRef::U32),
            KeyKind::I64 => Some(KeyRef::I64(value)),
            KeyKind::U64 => u64::try_from(value).ok().map(KeyRef::U64),
            _ => None,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyKind::Bytes => "bytes",
            KeyKind::BytesNoCase => "bytes-nocase",
            KeyKind::Str => "str",
            KeyKind::StrNoCase => "str-nocase",
            KeyKind::I32 => "i32",
            KeyKind::U32 => "u32",
            KeyKind::I64 => "i64",
            KeyKind::U64 => "u64",
        };
        f.write_str(name)
    }
}

/// An owned key of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Bytes(Vec<u8>),
    Str(String),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

/// A borrowed key of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRef<'a> {
    Bytes(&'a [u8]),
    Str(&'a str),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

impl Key {
    pub fn as_key_ref(&self) -> KeyRef<'_> {
        match self {
            Key::Bytes(b) => KeyRef::Bytes(b),
            Key::Str(s) => KeyRef::Str(s),
            Key::I32(v) => KeyRef::I32(*v),
            Key::U32(v) => KeyRef::U32(*v),
            Key::I64(v) => KeyRef::I64(*v),
            Key::U64(v) => KeyRef::U64(*v),
        }
    }

    /// The case-sensitive kind matching this key's representation.
    pub fn kind(&self) -> KeyKind {
        self.as_key_ref().kind()
    }
}

impl KeyRef<'_> {
    /// The case-sensitive kind matching this key's representation.
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyRef::Bytes(_) => KeyKind::Bytes,
            KeyRef::Str(_) => KeyKind::Str,
            KeyRef::I32(_) => KeyKind::I32,
            KeyRef::U32(_) => KeyKind::U32,
            KeyRef::I64(_) => KeyKind::I64,
            KeyRef::U64(_) => KeyKind::U64,
        }
    }

    pub fn to_key(self) -> Key {
        match self {
            KeyRef::Bytes(b) => Key::Bytes(b.to_vec()),
            KeyRef::Str(s) => Key::Str(s.to_owned()),
            KeyRef::I32(v) => Key::I32(v),
            KeyRef::U32(v) => Key::U32(v),
            KeyRef::I64(v) => Key::I64(v),
            KeyRef::U64(v) => Key::U64(v),
        }
    }
}

impl From<Vec<u8>> for Key {
    fn from(v: Vec<u8>) -> Self {
        Key::Bytes(v)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_owned())
    }
}

impl<'a> From<&'a [u8]> for KeyRef<'a> {
    fn from(b: &'a [u8]) -> Self {
        KeyRef::Bytes(b)
    }
}

impl<'a> From<&'a str> for KeyRef<'a> {
    fn from(s: &'a str) -> Self {
        KeyRef::Str(s)
    }
}

impl<'a> From<&'a Key> for KeyRef<'a> {
    fn from(k: &'a Key) -> Self {
        k.as_key_ref()
    }
}

macro_rules! int_key_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Key {
                fn from(v: $t) -> Self {
                    Key::$variant(v)
                }
            }

            impl From<$t> for KeyRef<'_> {
                fn from(v: $t) -> Self {
                    KeyRef::$variant(v)
                }
            }
        )*
    };
}

int_key_from!(i32 => I32, u32 => U32, i64 => I64, u64 => U64);

/// Hash and equality for the keys of one [`KeyKind`].
///
/// Byte and string keys hash with 64-bit FNV-1a (over the ASCII-lowercased
/// bytes for the caseless kinds); integer keys hash to their own value.
/// Keys of different representations are never equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindStrategy {
    kind: KeyKind,
}

impl KindStrategy {
    pub fn new(kind: KeyKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn hash_ref(&self, key: KeyRef<'_>) -> u64 {
        let fold = self.kind.is_caseless();
        match key {
            KeyRef::Bytes(b) => fnv1a(b, fold),
            KeyRef::Str(s) => fnv1a(s.as_bytes(), fold),
            KeyRef::I32(v) => v as i64 as u64,
            KeyRef::U32(v) => v as u64,
            KeyRef::I64(v) => v as u64,
            KeyRef::U64(v) => v,
        }
    }

    pub fn eq_refs(&self, a: KeyRef<'_>, b: KeyRef<'_>) -> bool {
        let fold = self.kind.is_caseless();
        match (a, b) {
            (KeyRef::Bytes(x), KeyRef::Bytes(y)) if fold => x.eq_ignore_ascii_case(y),
            (KeyRef::Str(x), KeyRef::Str(y)) if fold => x.eq_ignore_ascii_case(y),
            (a, b) => a == b,
        }
    }
}

impl KeyStrategy<Key> for KindStrategy {
    #[inline]
    fn hash_key(&self, key: &Key) -> u64 {
        self.hash_ref(key.as_key_ref())
    }

    #[inline]
    fn eq_keys(&self, a: &Key, b: &Key) -> bool {
        self.eq_refs(a.as_key_ref(), b.as_key_ref())
    }

    fn same_layout(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}
