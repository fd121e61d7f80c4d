// src/aur/cache.rs

//! Process-lifetime memoization of AUR lookups
//!
//! Nothing is ever evicted: once a record (or the full catalog) is stored it
//! stays authoritative until the cache is dropped. The record map is guarded
//! by a std `Mutex` held only for synchronous map operations. Filling the
//! cache from the network is serialized separately: the catalog is built at
//! most once through a `OnceCell`, and by-name misses are fetched under an
//! async fill lock so concurrent callers never request the same name twice.

use super::AurPackage;
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

/// Full catalog keyed by package name
pub type Catalog = BTreeMap<String, AurPackage>;

/// Shared cache of AUR metadata
#[derive(Debug, Default)]
pub struct MetadataCache {
    by_name: Mutex<HashMap<String, AurPackage>>,
    fill: tokio::sync::Mutex<()>,
    catalog: OnceCell<Arc<Catalog>>,
}

impl MetadataCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch one cached record
    pub fn get(&self, name: &str) -> Option<AurPackage> {
        lock(&self.by_name).get(name).cloned()
    }

    /// Split `names` into cached records and names that still need a request
    pub fn partition(&self, names: &[String]) -> (Vec<AurPackage>, Vec<String>) {
        let by_name = lock(&self.by_name);
        let mut hits = Vec::new();
        let mut misses = Vec::new();

        for name in names {
            match by_name.get(name) {
                Some(pkg) => hits.push(pkg.clone()),
                None => misses.push(name.clone()),
            }
        }

        (hits, misses)
    }

    /// Store records keyed by name
    pub fn insert_many<I>(&self, packages: I)
    where
        I: IntoIterator<Item = AurPackage>,
    {
        let mut by_name = lock(&self.by_name);
        for pkg in packages {
            by_name.insert(pkg.name.clone(), pkg);
        }
    }

    /// Number of records cached by name
    pub fn len(&self) -> usize {
        lock(&self.by_name).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize the miss-then-fetch-then-insert step of by-name lookups
    ///
    /// Callers re-check the cache after acquiring the guard; names another
    /// caller fetched meanwhile are then hits.
    pub async fn fill_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.fill.lock().await
    }

    /// The cached catalog, if it has been enumerated already
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.catalog.get().cloned()
    }

    /// Return the catalog, building it with `init` if nobody has yet
    ///
    /// Concurrent callers wait for the one running `init`. A failed `init`
    /// leaves the slot empty so a later call retries.
    pub async fn catalog_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<Catalog>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Catalog>>,
    {
        self.catalog
            .get_or_try_init(|| async move { init().await.map(Arc::new) })
            .await
            .cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
