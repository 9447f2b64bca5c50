use std::collections::BTreeMap;

use crate::types::error::{DatabaseError, Result};

/// Ordered iteration over an index. Persistent indexes read nodes lazily, so
/// each step can fail.
pub type Entries<'a, K, V> = Box<dyn Iterator<Item = Result<(K, V)>> + 'a>;

/// Capability contract shared by every ordered index backend.
pub trait OrderedIndex<K, V> {
    /// Inserts `value` under `key`, overwriting any existing value.
    fn insert(&mut self, key: K, value: V) -> Result<()>;

    /// Fails with [`DatabaseError::KeyNotFound`] when `key` is absent.
    fn get(&self, key: &K) -> Result<V>;

    fn contains(&self, key: &K) -> Result<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(DatabaseError::KeyNotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Removes `key`. An absent key fails with [`DatabaseError::KeyNotFound`]
    /// and leaves the index untouched.
    fn delete(&mut self, key: &K) -> Result<()>;

    /// Entries in strictly ascending key order. Every call starts over.
    fn entries(&self) -> Entries<'_, K, V>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether [`OrderedIndex::delete`] is implemented by this backend.
    fn supports_delete(&self) -> bool {
        true
    }
}

/// Reference backend over the standard library map.
#[derive(Debug, Clone, Default)]
pub struct BTreeMapIndex<K, V> {
    map: BTreeMap<K, V>,
}

impl<K: Ord, V> BTreeMapIndex<K, V> {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<K, V> OrderedIndex<K, V> for BTreeMapIndex<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.map.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Result<V> {
        self.map.get(key).cloned().ok_or(DatabaseError::KeyNotFound)
    }

    fn contains(&self, key: &K) -> Result<bool> {
        Ok(self.map.contains_key(key))
    }

    fn delete(&mut self, key: &K) -> Result<()> {
        self.map
            .remove(key)
            .map(|_| ())
            .ok_or(DatabaseError::KeyNotFound)
    }

    fn entries(&self) -> Entries<'_, K, V> {
        Box::new(self.map.iter().map(|(k, v)| Ok((k.clone(), v.clone()))))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.map.len())
    }
}
