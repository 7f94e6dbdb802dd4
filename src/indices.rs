//! Index engine: bucket storage and the maintenance algorithms keeping it
//! consistent with the primary item map.
//!
//! The engine is a plain data structure. Locking and registry ownership live
//! in [`crate::store::Store`], which drives every method here from inside
//! its exclusive critical section.

use crate::error::{Result, StoreError};
use crate::indexers::{IndexFunc, Indexers};
use std::collections::{HashMap, HashSet};

/// Set of primary keys associated with one (index name, index value) pair.
pub type Bucket = HashSet<String>;

/// One secondary index: index value -> bucket of primary keys.
pub type Index = HashMap<String, Bucket>;

/// All secondary indices, keyed by index name.
///
/// Holds no information that is not reconstructible from the item map plus
/// the registry; [`IndexEngine::rebuild`] reproduces it from scratch.
#[derive(Default)]
pub struct IndexEngine {
    indices: HashMap<String, Index>,
}

impl IndexEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket for an exact (index name, index value) pair, if populated.
    pub fn bucket(&self, name: &str, index_value: &str) -> Option<&Bucket> {
        self.indices.get(name)?.get(index_value)
    }

    /// Distinct populated index values for `name`, arbitrary order.
    ///
    /// Unknown names yield an empty vec rather than an error; emptiness and
    /// absence are indistinguishable here by design.
    pub fn index_values(&self, name: &str) -> Vec<String> {
        self.indices
            .get(name)
            .map(|index| index.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Move `key` into the buckets implied by `new`, first clearing the
    /// buckets implied by `old` when present.
    ///
    /// Buckets are created lazily on insertion. Removal tolerates buckets
    /// that no longer contain the key: a prior partial failure may already
    /// have dropped it, and absence must not compound the damage.
    ///
    /// A failing indexer does not halt the pass; the remaining indexers are
    /// still reconciled and the first failure is returned so the caller can
    /// decide what to surface.
    pub fn reconcile<V>(
        &mut self,
        indexers: &Indexers<V>,
        old: Option<&V>,
        new: &V,
        key: &str,
    ) -> Result<()> {
        let mut first_err = None;

        if let Some(old) = old {
            if let Err(e) = self.remove_key(indexers, old, key) {
                first_err = Some(e);
            }
        }

        for (name, func) in indexers.iter() {
            let index_values = match evaluate(name, func, new) {
                Ok(values) => values,
                Err(e) => {
                    first_err.get_or_insert(e);
                    continue;
                }
            };

            let index = self.indices.entry(name.to_string()).or_default();
            for index_value in index_values {
                index.entry(index_value).or_default().insert(key.to_string());
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Remove `key` from every bucket implied by `value`. Used by delete.
    pub fn reconcile_removal<V>(
        &mut self,
        indexers: &Indexers<V>,
        value: &V,
        key: &str,
    ) -> Result<()> {
        self.remove_key(indexers, value, key)
    }

    /// Discard all indices and recompute them from `items`.
    ///
    /// Intentionally a full rebuild rather than an incremental diff: the
    /// caller is resynchronizing wholesale and the prior index state is
    /// assumed stale.
    pub fn rebuild<V>(&mut self, indexers: &Indexers<V>, items: &HashMap<String, V>) -> Result<()> {
        self.indices.clear();

        let mut first_err = None;
        for (key, value) in items {
            if let Err(e) = self.reconcile(indexers, None, value, key) {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn remove_key<V>(&mut self, indexers: &Indexers<V>, value: &V, key: &str) -> Result<()> {
        let mut first_err = None;

        for (name, func) in indexers.iter() {
            let index_values = match evaluate(name, func, value) {
                Ok(values) => values,
                Err(e) => {
                    first_err.get_or_insert(e);
                    continue;
                }
            };

            let Some(index) = self.indices.get_mut(name) else {
                continue;
            };
            for index_value in index_values {
                if let Some(bucket) = index.get_mut(&index_value) {
                    bucket.remove(key);
                    // Empty buckets stay; membership tests on them remain correct.
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Run one index function, wrapping its failure with the indexer's name.
pub(crate) fn evaluate<V>(name: &str, func: &IndexFunc<V>, value: &V) -> Result<Vec<String>> {
    func(value).map_err(|source| StoreError::IndexFunction {
        name: name.to_string(),
        source,
    })
}
