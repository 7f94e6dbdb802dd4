//! Main Store struct tying the primary map and index engine together.

use crate::error::{Result, StoreError};
use crate::indexers::Indexers;
use crate::indices::{evaluate, IndexEngine};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// The guarded state: primary items plus derived indices.
///
/// Kept behind one lock as a single unit of consistency, so no reader can
/// observe the two mid-reconciliation.
struct Inner<V> {
    items: HashMap<String, V>,
    indices: IndexEngine,
}

/// A thread-safe keyed store with pluggable secondary indices.
///
/// Values are stored under unique string keys. At construction the store is
/// bound to an immutable [`Indexers`] registry; every mutation reconciles
/// the affected index buckets inside the same exclusive critical section as
/// the data change, and every read takes the shared side of the same lock.
///
/// Reads hand back clones of stored values, never references into the
/// guarded state, so callers cannot desynchronize the indices by mutating
/// what they were given.
///
/// Index function failures during `upsert`/`delete`/`replace` do not fail
/// the mutation: the primary map change stands, the remaining indexers are
/// still reconciled, and the failure is reported through a `tracing` warn
/// event. Until the next successful reconciliation or full [`replace`],
/// that indexer's buckets may be stale for the affected key. The same
/// failure on the query path ([`index_lookup`]) is returned to the caller.
///
/// [`replace`]: Store::replace
/// [`index_lookup`]: Store::index_lookup
pub struct Store<V> {
    /// Fixed at construction; never mutated afterward.
    indexers: Indexers<V>,

    /// Lock over (items, indices) jointly.
    inner: RwLock<Inner<V>>,
}

impl<V: Clone> Store<V> {
    /// Create an empty store bound permanently to `indexers`.
    pub fn new(indexers: Indexers<V>) -> Self {
        Self {
            indexers,
            inner: RwLock::new(Inner {
                items: HashMap::new(),
                indices: IndexEngine::new(),
            }),
        }
    }

    // --- Primary operations ---

    /// Insert `value` under `key`, overwriting any previous value.
    ///
    /// Overwriting is indistinguishable in effect from delete-then-insert:
    /// the key leaves the old value's buckets and enters the new value's.
    pub fn upsert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut inner = self.inner.write();
        let old = inner.items.insert(key.clone(), value.clone());
        if let Err(e) = inner
            .indices
            .reconcile(&self.indexers, old.as_ref(), &value, &key)
        {
            warn!(key = %key, error = %e, "index reconciliation failed during upsert");
        }
    }

    /// Remove `key` if present; no-op otherwise.
    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.write();
        if let Some(old) = inner.items.remove(key) {
            if let Err(e) = inner.indices.reconcile_removal(&self.indexers, &old, key) {
                warn!(key = %key, error = %e, "index reconciliation failed during delete");
            }
        }
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.read().items.get(key).cloned()
    }

    /// Snapshot of all current values, arbitrary order.
    pub fn list(&self) -> Vec<V> {
        self.inner.read().items.values().cloned().collect()
    }

    /// Snapshot of all current keys, arbitrary order.
    pub fn list_keys(&self) -> Vec<String> {
        self.inner.read().items.keys().cloned().collect()
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    /// Whether the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    /// Discard all current items and indices, install `items`, and rebuild
    /// every index from scratch.
    ///
    /// This is a full resynchronization: the prior index state is assumed
    /// stale and is never diffed against.
    pub fn replace(&self, items: HashMap<String, V>) {
        let mut inner = self.inner.write();
        debug!(
            old_items = inner.items.len(),
            new_items = items.len(),
            "replacing store contents"
        );
        inner.items = items;
        let Inner { items, indices } = &mut *inner;
        if let Err(e) = indices.rebuild(&self.indexers, items) {
            warn!(error = %e, "index reconciliation failed during replace rebuild");
        }
    }

    // --- Index queries ---

    /// Values matching `probe` under the named index.
    ///
    /// Evaluates the index function on `probe` (which need not be stored),
    /// unions the buckets for the produced index values, and returns the
    /// stored values for the deduplicated key set.
    pub fn index_lookup(&self, name: &str, probe: &V) -> Result<Vec<V>> {
        let func = self
            .indexers
            .get(name)
            .ok_or_else(|| StoreError::IndexNotFound(name.to_string()))?;

        let inner = self.inner.read();
        let index_values = evaluate(name, func, probe)?;

        // Overlapping buckets may repeat a key; dedupe before resolving.
        let mut keys = HashSet::new();
        for index_value in &index_values {
            if let Some(bucket) = inner.indices.bucket(name, index_value) {
                keys.extend(bucket.iter());
            }
        }

        Ok(keys
            .into_iter()
            .filter_map(|key| inner.items.get(key).cloned())
            .collect())
    }

    /// Values whose bucket for the exact (index name, index value) pair
    /// contains them; empty if the bucket is empty or absent.
    pub fn by_index_value(&self, name: &str, index_value: &str) -> Result<Vec<V>> {
        if !self.indexers.contains(name) {
            return Err(StoreError::IndexNotFound(name.to_string()));
        }

        let inner = self.inner.read();
        let Some(bucket) = inner.indices.bucket(name, index_value) else {
            return Ok(Vec::new());
        };

        Ok(bucket
            .iter()
            .filter_map(|key| inner.items.get(key).cloned())
            .collect())
    }

    /// Distinct populated index values for `name`, arbitrary order.
    ///
    /// Unknown names yield an empty vec, not an error.
    pub fn list_index_values(&self, name: &str) -> Vec<String> {
        self.inner.read().indices.index_values(name)
    }

    /// Names registered in the store's indexer registry.
    pub fn index_names(&self) -> Vec<String> {
        self.indexers.names()
    }
}
