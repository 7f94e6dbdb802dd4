//! # Facetmap
//!
//! A thread-safe, in-memory keyed store that maintains pluggable secondary
//! indices consistently under concurrent access.
//!
//! ## Core Concepts
//!
//! - **Items**: values of one caller-chosen type, stored under unique
//!   string keys
//! - **Indexers**: named, fallible functions deriving index values from a
//!   stored value, fixed at construction
//! - **Buckets**: per (index name, index value) sets of primary keys,
//!   reconciled incrementally on every mutation
//! - **Replace**: bulk resynchronization that rebuilds every index from
//!   scratch
//!
//! ## Example
//!
//! ```
//! use facetmap::{Indexers, Store};
//!
//! #[derive(Clone)]
//! struct Pod { namespace: String }
//!
//! let store = Store::new(Indexers::new().with("by_namespace", |pod: &Pod| {
//!     Ok(vec![pod.namespace.clone()])
//! }));
//!
//! store.upsert("default/web", Pod { namespace: "default".into() });
//! let pods = store.by_index_value("by_namespace", "default")?;
//! assert_eq!(pods.len(), 1);
//! # Ok::<(), facetmap::StoreError>(())
//! ```

pub mod error;
pub mod indexers;
pub mod indices;
pub mod store;

// Re-exports
pub use error::{BoxError, Result, StoreError};
pub use indexers::{IndexFunc, Indexers};
pub use indices::{Bucket, Index, IndexEngine};
pub use store::Store;
