//! In-memory product storage.
//!
//! All records and the identifier counter live behind one [`Mutex`]. Every operation takes the
//! lock for its whole read-modify-write sequence, so each call is atomic with respect to every
//! other call and identifiers are handed out strictly in order.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::metrics::{CatalogMetrics, MetricsSnapshot};

/// Errors surfaced by catalog operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No record exists for the requested identifier.
    #[error("product {0} not found")]
    NotFound(u64),
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Identifier assigned by the store.
    pub id: u64,
    /// Display name supplied by the caller.
    pub name: String,
    /// Price in the caller's units; negative values are accepted.
    pub price: i64,
}

/// Caller-supplied fields for create and update requests.
///
/// Missing fields fall back to their zero values and unknown fields (including `id`) are
/// ignored, so an identifier in the request body can never reach the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    /// Display name.
    pub name: String,
    /// Price.
    pub price: i64,
}

impl ProductInput {
    fn into_product(self, id: u64) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
        }
    }
}

/// Storage seam used by the HTTP handlers.
///
/// Implementations must serialise every call; none of these methods may block on I/O.
pub trait Catalog: Send + Sync {
    /// Insert a new record under the next identifier and return it.
    fn create(&self, input: ProductInput) -> Product;

    /// Fetch the record stored under `id`.
    fn get(&self, id: u64) -> Result<Product, CatalogError>;

    /// Replace the record stored under `id`, keeping the identifier.
    fn update(&self, id: u64, input: ProductInput) -> Result<Product, CatalogError>;

    /// Remove the record stored under `id`.
    fn delete(&self, id: u64) -> Result<(), CatalogError>;

    /// Return every stored record in ascending identifier order.
    fn list(&self) -> Vec<Product>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

struct Inner {
    records: BTreeMap<u64, Product>,
    next_id: u64,
}

/// Mutex-guarded product store owned by the server process.
///
/// Construct it once at startup and share it through an `Arc`.
pub struct ProductStore {
    inner: Mutex<Inner>,
    metrics: CatalogMetrics,
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductStore {
    /// Create an empty store whose first identifier is `1`.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: BTreeMap::new(),
                next_id: 1,
            }),
            metrics: CatalogMetrics::new(),
        }
    }

    // Each mutation is a single map operation, so a panic elsewhere cannot leave the map
    // half-written; recover the guard instead of propagating the poison.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Catalog for ProductStore {
    fn create(&self, input: ProductInput) -> Product {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        let product = input.into_product(id);
        inner.records.insert(id, product.clone());
        self.metrics.record_created();
        product
    }

    fn get(&self, id: u64) -> Result<Product, CatalogError> {
        self.lock()
            .records
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    fn update(&self, id: u64, input: ProductInput) -> Result<Product, CatalogError> {
        let mut inner = self.lock();
        let slot = inner
            .records
            .get_mut(&id)
            .ok_or(CatalogError::NotFound(id))?;
        *slot = input.into_product(id);
        self.metrics.record_updated();
        Ok(slot.clone())
    }

    fn delete(&self, id: u64) -> Result<(), CatalogError> {
        let mut inner = self.lock();
        inner
            .records
            .remove(&id)
            .ok_or(CatalogError::NotFound(id))?;
        self.metrics.record_deleted();
        Ok(())
    }

    fn list(&self) -> Vec<Product> {
        self.lock().records.values().cloned().collect()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        // counters only move while the lock is held
        let inner = self.lock();
        self.metrics.snapshot(inner.records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn input(name: &str, price: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            price,
        }
    }

    #[test]
    fn assigns_sequential_ids_from_one() {
        let store = ProductStore::new();
        assert_eq!(store.create(input("A", 10)).id, 1);
        assert_eq!(store.create(input("B", 20)).id, 2);
    }

    #[test]
    fn deleted_ids_are_never_reused() {
        let store = ProductStore::new();
        store.create(input("A", 10));
        store.create(input("B", 20));
        store.delete(1).expect("delete existing");

        let third = store.create(input("C", 30));
        assert_eq!(third.id, 3);
        assert_eq!(store.get(1), Err(CatalogError::NotFound(1)));
    }

    #[test]
    fn update_replaces_whole_record() {
        let store = ProductStore::new();
        store.create(input("Original", 5));

        let updated = store.update(1, input("Renamed", -3)).expect("update");
        assert_eq!(
            updated,
            Product {
                id: 1,
                name: "Renamed".into(),
                price: -3
            }
        );
        assert_eq!(store.get(1).expect("get"), updated);
    }

    #[test]
    fn missing_ids_report_not_found() {
        let store = ProductStore::new();
        assert_eq!(store.get(7), Err(CatalogError::NotFound(7)));
        assert_eq!(store.update(7, input("x", 1)), Err(CatalogError::NotFound(7)));
        assert_eq!(store.delete(7), Err(CatalogError::NotFound(7)));
        // a failed update must not consume an identifier
        assert_eq!(store.create(input("A", 1)).id, 1);
    }

    #[test]
    fn list_is_ordered_by_id() {
        let store = ProductStore::new();
        assert!(store.list().is_empty());
        for name in ["c", "a", "b"] {
            store.create(input(name, 0));
        }
        store.delete(2).expect("delete");

        let ids: Vec<u64> = store.list().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn input_ignores_id_and_defaults_missing_fields() {
        let parsed: ProductInput =
            serde_json::from_str(r#"{"id": 99, "name": "A"}"#).expect("parse");
        assert_eq!(parsed, input("A", 0));
    }

    #[test]
    fn metrics_track_successful_mutations_only() {
        let store = ProductStore::new();
        store.create(input("A", 1));
        store.create(input("B", 2));
        store.update(2, input("B2", 3)).expect("update");
        let _ = store.update(9, input("none", 0));
        store.delete(1).expect("delete");
        let _ = store.delete(1);

        let snapshot = store.metrics_snapshot();
        assert_eq!(snapshot.products_created, 2);
        assert_eq!(snapshot.products_updated, 1);
        assert_eq!(snapshot.products_deleted, 1);
        assert_eq!(snapshot.products_stored, 1);
    }

    #[test]
    fn metrics_snapshot_is_consistent_under_concurrent_mutation() {
        let store = Arc::new(ProductStore::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for n in 0..200 {
                        let id = store.create(input("churn", n)).id;
                        if n % 2 == 0 {
                            store.delete(id).expect("delete own record");
                        }
                    }
                })
            })
            .collect();

        for _ in 0..500 {
            let snapshot = store.metrics_snapshot();
            assert_eq!(
                snapshot.products_created - snapshot.products_deleted,
                snapshot.products_stored,
                "{snapshot:?}"
            );
        }
        for writer in writers {
            writer.join().expect("writer thread");
        }
        let snapshot = store.metrics_snapshot();
        assert_eq!(snapshot.products_created, 800);
        assert_eq!(snapshot.products_stored, 400);
    }

    #[test]
    fn concurrent_creates_receive_distinct_ids() {
        let store = Arc::new(ProductStore::new());
        let handles: Vec<_> = (0..16)
            .map(|worker| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|n| store.create(input(&format!("w{worker}-{n}"), n)).id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            let per_thread = handle.join().expect("worker thread");
            assert!(per_thread.windows(2).all(|pair| pair[0] < pair[1]));
            ids.extend(per_thread);
        }
        ids.sort_unstable();
        let expected: Vec<u64> = (1..=400).collect();
        assert_eq!(ids, expected);
    }
}
