//! Optional disposal hooks for keys and values leaving a table.

use std::fmt;

pub type KeyDestructor<K> = Box<dyn FnMut(K)>;
pub type ValueDestructor<V> = Box<dyn FnMut(V)>;

/// Hooks run on keys and values the table discards (overwrite, remove,
/// destroying clear, merges). Without a hook the payload is dropped.
pub struct Destructors<K, V> {
    pub(crate) key: Option<KeyDestructor<K>>,
    pub(crate) value: Option<ValueDestructor<V>>,
}

impl<K, V> Destructors<K, V> {
    pub fn none() -> Self {
        Self {
            key: None,
            value: None,
        }
    }

    pub fn new(key: Option<KeyDestructor<K>>, value: Option<ValueDestructor<V>>) -> Self {
        Self { key, value }
    }

    pub fn has_key_destructor(&self) -> bool {
        self.key.is_some()
    }

    pub fn has_value_destructor(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub(crate) fn destroy_key(&mut self, key: K) {
        match self.key.as_mut() {
            Some(f) => f(key),
            None => drop(key),
        }
    }

    #[inline]
    pub(crate) fn destroy_value(&mut self, value: V) {
        match self.value.as_mut() {
            Some(f) => f(value),
            None => drop(value),
        }
    }

    #[inline]
    pub(crate) fn destroy(&mut self, key: K, value: V) {
        self.destroy_key(key);
        self.destroy_value(value);
    }
}

impl<K, V> Default for Destructors<K, V> {
    fn default() -> Self {
        Self::none()
    }
}

impl<K, V> fmt::Debug for Destructors<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destructors")
            .field("key", &self.has_key_destructor())
            .field("value", &self.has_value_destructor())
            .finish()
    }
}
