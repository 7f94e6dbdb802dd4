//! Integration tests for the indexed store.

use facetmap::{Indexers, Store, StoreError};
use serde_json::{json, Value};
use std::collections::HashMap;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Clone, Debug, PartialEq)]
struct Item {
    color: String,
    tags: Vec<String>,
}

fn item(color: &str, tags: &[&str]) -> Item {
    Item {
        color: color.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn test_store() -> Store<Item> {
    Store::new(
        Indexers::new()
            .with("by_color", |i: &Item| Ok(vec![i.color.clone()]))
            .with("by_tag", |i: &Item| Ok(i.tags.clone())),
    )
}

// --- Primary operations ---

#[test]
fn test_upsert_and_overwrite() {
    let store = test_store();

    store.upsert("k", item("red", &[]));
    assert_eq!(store.get("k"), Some(item("red", &[])));

    store.upsert("k", item("blue", &[]));
    assert_eq!(store.get("k"), Some(item("blue", &[])));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_delete_clears_buckets() {
    let store = test_store();

    store.upsert("k", item("red", &["x"]));
    assert_eq!(store.by_index_value("by_tag", "x").unwrap().len(), 1);

    store.delete("k");
    assert!(store.by_index_value("by_tag", "x").unwrap().is_empty());
    assert!(store.by_index_value("by_color", "red").unwrap().is_empty());
}

#[test]
fn test_update_moves_bucket_membership() {
    let store = test_store();

    store.upsert("k", item("red", &["a"]));
    store.upsert("k", item("red", &["b"]));

    assert!(store.by_index_value("by_tag", "a").unwrap().is_empty());
    assert_eq!(
        store.by_index_value("by_tag", "b").unwrap(),
        vec![item("red", &["b"])]
    );
}

#[test]
fn test_replace_rebuild_completeness() {
    let store = test_store();

    store.upsert("old1", item("red", &["x"]));
    store.upsert("old2", item("red", &["y"]));
    assert_eq!(store.by_index_value("by_color", "red").unwrap().len(), 2);

    let mut new_items = HashMap::new();
    new_items.insert("new1".to_string(), item("green", &["x"]));
    store.replace(new_items);

    // Keys absent from the new set are gone from every bucket.
    assert!(store.by_index_value("by_color", "red").unwrap().is_empty());
    assert!(store.by_index_value("by_tag", "y").unwrap().is_empty());

    // The new set is fully indexed.
    assert_eq!(
        store.by_index_value("by_color", "green").unwrap(),
        vec![item("green", &["x"])]
    );
    assert_eq!(
        store.by_index_value("by_tag", "x").unwrap(),
        vec![item("green", &["x"])]
    );
    assert_eq!(store.list_keys(), vec!["new1".to_string()]);
}

// --- Index queries ---

#[test]
fn test_index_lookup_dedupes_overlapping_buckets() {
    let store = test_store();

    // One stored key reachable through two index values of the same index.
    store.upsert("k", item("red", &["x", "y"]));

    let probe = item("other", &["x", "y"]);
    let matches = store.index_lookup("by_tag", &probe).unwrap();
    assert_eq!(matches, vec![item("red", &["x", "y"])]);
}

#[test]
fn test_unknown_index_errors() {
    let store = test_store();

    let err = store
        .index_lookup("missing", &item("red", &[]))
        .unwrap_err();
    assert!(matches!(err, StoreError::IndexNotFound(ref n) if n == "missing"));

    let err = store.by_index_value("missing", "v").unwrap_err();
    assert!(matches!(err, StoreError::IndexNotFound(ref n) if n == "missing"));

    // list_index_values treats unknown names as empty, not as an error.
    assert!(store.list_index_values("missing").is_empty());
}

#[test]
fn test_list_index_values() {
    let store = test_store();

    store.upsert("k1", item("red", &[]));
    store.upsert("k2", item("blue", &[]));

    let mut values = store.list_index_values("by_color");
    values.sort();
    assert_eq!(values, vec!["blue".to_string(), "red".to_string()]);
}

#[test]
fn test_by_index_value_empty_bucket() {
    let store = test_store();
    store.upsert("k", item("red", &[]));

    // Known index, unpopulated value.
    assert!(store.by_index_value("by_color", "chartreuse").unwrap().is_empty());
}

// --- Scenario over untyped JSON values ---

#[test]
fn test_by_color_scenario() {
    let store: Store<Value> = Store::new(Indexers::new().with("by_color", |v: &Value| {
        match v.get("Color").and_then(Value::as_str) {
            Some(color) => Ok(vec![color.to_string()]),
            None => Err("value has no Color field".into()),
        }
    }));

    store.upsert("a", json!({"Color": "red"}));
    store.upsert("b", json!({"Color": "blue"}));

    assert_eq!(
        store.by_index_value("by_color", "red").unwrap(),
        vec![json!({"Color": "red"})]
    );

    store.upsert("a", json!({"Color": "blue"}));

    assert!(store.by_index_value("by_color", "red").unwrap().is_empty());
    assert_eq!(store.by_index_value("by_color", "blue").unwrap().len(), 2);
}

// --- Failing indexers ---

#[test]
fn test_failing_indexer_degrades_only_itself() {
    init_tracing();
    let store: Store<Item> = Store::new(
        Indexers::new()
            .with("by_color", |i: &Item| Ok(vec![i.color.clone()]))
            .with("picky", |i: &Item| {
                if i.tags.is_empty() {
                    Err("no tags".into())
                } else {
                    Ok(i.tags.clone())
                }
            }),
    );

    // The picky indexer fails for this value; the mutation still lands and
    // the healthy indexer stays consistent.
    store.upsert("k", item("red", &[]));
    assert_eq!(store.get("k"), Some(item("red", &[])));
    assert_eq!(store.by_index_value("by_color", "red").unwrap().len(), 1);

    // Query-path evaluation of the same failure is surfaced to the caller.
    let err = store.index_lookup("picky", &item("red", &[])).unwrap_err();
    assert!(matches!(err, StoreError::IndexFunction { ref name, .. } if name == "picky"));

    // A replace rebuild with indexable values restores full consistency.
    let mut items = HashMap::new();
    items.insert("k".to_string(), item("red", &["t"]));
    store.replace(items);
    assert_eq!(store.by_index_value("picky", "t").unwrap().len(), 1);
}
