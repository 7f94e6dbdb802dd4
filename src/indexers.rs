//! Named index functions and the immutable registry holding them.

use crate::error::BoxError;
use std::collections::HashMap;
use std::fmt;

/// A function deriving zero or more index values from a stored value.
///
/// Invoked once per value per registered indexer on every upsert, delete,
/// and replace-rebuild item, plus once per probe on `index_lookup`.
pub type IndexFunc<V> = Box<dyn Fn(&V) -> Result<Vec<String>, BoxError> + Send + Sync>;

/// Registry of named index functions.
///
/// Built once with [`Indexers::with`] and bound permanently to a store at
/// construction. There is no way to add, remove, or replace an indexer on a
/// live store; rebuild the store if the index set changes.
pub struct Indexers<V> {
    funcs: HashMap<String, IndexFunc<V>>,
}

impl<V> Indexers<V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            funcs: HashMap::new(),
        }
    }

    /// Register an index function under `name`, consuming and returning the
    /// registry so registrations chain. A repeated name replaces the earlier
    /// function.
    pub fn with<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&V) -> Result<Vec<String>, BoxError> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Box::new(func));
        self
    }

    /// Get the index function registered under `name`.
    pub fn get(&self, name: &str) -> Option<&IndexFunc<V>> {
        self.funcs.get(name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Iterate over (name, function) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexFunc<V>)> {
        self.funcs.iter().map(|(name, func)| (name.as_str(), func))
    }

    /// Registered index names in arbitrary order.
    pub fn names(&self) -> Vec<String> {
        self.funcs.keys().cloned().collect()
    }

    /// Number of registered indexers.
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl<V> Default for Indexers<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Indexers<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indexers")
            .field("names", &self.funcs.keys().collect::<Vec<_>>())
            .finish()
    }
}
