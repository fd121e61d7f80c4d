// src/aur/mod.rs

//! AUR metadata queries
//!
//! This module provides:
//! - The `AurPackage` model of one RPC result
//! - Request builders for the `search` and `info` RPC calls
//! - `AurClient`, which batches, fans out and caches lookups

pub mod cache;

pub use cache::{Catalog, MetadataCache};

use crate::error::{Error, Result};
use crate::packages::PackageRecord;
use crate::pool;
use crate::rpc::{QueryResult, RpcTransport};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum number of `arg[]` entries the service accepts per info request
pub const INFO_BATCH_SIZE: usize = 100;

/// Maximum search requests in flight while enumerating the catalog
pub const CATALOG_CONCURRENCY: usize = 64;

/// Characters combined pairwise to enumerate the catalog
const SEARCH_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// One package as returned by the AUR RPC interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AurPackage {
    #[serde(rename = "ID", default)]
    pub id: Option<u64>,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "PackageBaseID", default)]
    pub package_base_id: Option<u64>,
    #[serde(default)]
    pub package_base: Option<String>,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
    #[serde(rename = "URLPath", default)]
    pub url_path: Option<String>,
    #[serde(default)]
    pub num_votes: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub out_of_date: Option<i64>,
    #[serde(default)]
    pub maintainer: Option<String>,
    #[serde(default)]
    pub first_submitted: Option<i64>,
    #[serde(default)]
    pub last_modified: Option<i64>,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub make_depends: Vec<String>,
    #[serde(default)]
    pub check_depends: Vec<String>,
    #[serde(default)]
    pub opt_depends: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub replaces: Vec<String>,
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub license: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl AurPackage {
    /// Create a record with only name and version set
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            version: version.into(),
            description: None,
            package_base_id: None,
            package_base: None,
            url: None,
            url_path: None,
            num_votes: 0,
            popularity: 0.0,
            out_of_date: None,
            maintainer: None,
            first_submitted: None,
            last_modified: None,
            depends: Vec::new(),
            make_depends: Vec::new(),
            check_depends: Vec::new(),
            opt_depends: Vec::new(),
            conflicts: Vec::new(),
            replaces: Vec::new(),
            provides: Vec::new(),
            groups: Vec::new(),
            license: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

impl PackageRecord for AurPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    fn replaces(&self) -> &[String] {
        &self.replaces
    }

    fn provides(&self) -> &[String] {
        &self.provides
    }
}

/// Envelope of every RPC response
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(rename = "type", default)]
    response_type: Option<String>,
    #[serde(default)]
    results: Vec<AurPackage>,
    #[serde(default)]
    error: Option<String>,
}

/// One pending RPC call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AurQuery {
    /// Search package names and descriptions for a term
    Search(String),
    /// Fetch full records for up to `INFO_BATCH_SIZE` names
    Info(Vec<String>),
}

impl AurQuery {
    /// Query-encoded request path
    pub fn path(&self) -> String {
        match self {
            AurQuery::Search(term) => format!(
                "/rpc/?v=5&type=search&arg={}&by=name-desc",
                urlencoding::encode(term)
            ),
            AurQuery::Info(names) => {
                let mut path = String::from("/rpc/?v=5&type=info");
                for name in names {
                    path.push_str("&arg[]=");
                    path.push_str(&urlencoding::encode(name));
                }
                path
            }
        }
    }
}

/// Outcome of a by-name lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    pub found: Vec<AurPackage>,
    pub not_found: Vec<String>,
}

/// Every ordered pair of distinct characters from `SEARCH_ALPHABET`
///
/// The service has no "list everything" call and rejects one-character
/// searches, so the catalog is discovered by searching all 1260 pairs.
pub fn catalog_search_terms() -> Vec<String> {
    let mut terms = Vec::new();
    for first in SEARCH_ALPHABET.chars() {
        for second in SEARCH_ALPHABET.chars() {
            if first != second {
                terms.push(format!("{}{}", first, second));
            }
        }
    }
    terms
}

/// Batched, cached access to the AUR RPC interface
pub struct AurClient<T> {
    transport: T,
    cache: Arc<MetadataCache>,
    info_batch_size: usize,
    catalog_concurrency: usize,
}

impl<T: RpcTransport> AurClient<T> {
    /// Create a client with the service's default limits
    pub fn new(transport: T, cache: Arc<MetadataCache>) -> Self {
        Self {
            transport,
            cache,
            info_batch_size: INFO_BATCH_SIZE,
            catalog_concurrency: CATALOG_CONCURRENCY,
        }
    }

    /// Override the batch size and catalog concurrency
    ///
    /// The batch size is capped at `INFO_BATCH_SIZE`, the most the service
    /// accepts in one info request.
    pub fn with_limits(mut self, info_batch_size: usize, catalog_concurrency: usize) -> Self {
        self.info_batch_size = info_batch_size.clamp(1, INFO_BATCH_SIZE);
        self.catalog_concurrency = catalog_concurrency.max(1);
        self
    }

    /// Shared cache backing this client
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Git clone URL of a package base
    pub fn package_source_url(&self, package_base: &str) -> String {
        format!("https://{}/{}.git", self.transport.host(), package_base)
    }

    /// Search the AUR for a term
    ///
    /// Search results lack relationship fields, so they are not cached.
    pub async fn search(&self, term: &str) -> Result<Vec<AurPackage>> {
        self.execute(AurQuery::Search(term.to_string())).await
    }

    /// Search for packages matching every term
    ///
    /// One search runs per term, all at once; only packages present in
    /// every result set are kept. With `names_only`, a result counts for a
    /// term only when the term occurs in its name. No terms at all lists
    /// the whole catalog.
    pub async fn search_all<S: AsRef<str>>(
        &self,
        terms: &[S],
        names_only: bool,
    ) -> Result<Vec<AurPackage>> {
        if terms.is_empty() {
            return Ok(self.list_catalog().await?.values().cloned().collect());
        }

        let tasks: Vec<_> = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (idx, self.search(term.as_ref())))
            .collect();
        let results = pool::run_concurrent(tasks, 0).await?;

        let mut per_term: Vec<Vec<AurPackage>> = Vec::with_capacity(results.len());
        for (idx, packages) in results {
            let term = terms[idx].as_ref();
            per_term.push(
                packages
                    .into_iter()
                    .filter(|pkg| !names_only || pkg.name.contains(term))
                    .collect(),
            );
        }

        let mut common: Option<HashSet<String>> = None;
        for packages in &per_term {
            let names: HashSet<String> = packages.iter().map(|pkg| pkg.name.clone()).collect();
            common = Some(match common {
                Some(previous) => previous.intersection(&names).cloned().collect(),
                None => names,
            });
        }
        let common = common.unwrap_or_default();

        let mut seen = HashSet::new();
        let matches: Vec<AurPackage> = per_term
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .filter(|pkg| common.contains(&pkg.name) && seen.insert(pkg.name.clone()))
            .collect();

        debug!("{} packages match all {} terms", matches.len(), terms.len());
        Ok(matches)
    }

    /// Resolve package names to AUR records
    ///
    /// Cached names are never requested again. The rest are fetched in
    /// concurrent info requests of at most `info_batch_size` names each.
    /// Names are matched exactly (case-sensitive) against `Name`. Every
    /// record the service returns is kept in `found`, including ones whose
    /// name differs from the requested spelling; such a requested name is
    /// still reported in `not_found`.
    pub async fn lookup_by_names<S: AsRef<str>>(&self, names: &[S]) -> Result<LookupResult> {
        let mut seen = HashSet::new();
        let wanted: Vec<String> = names
            .iter()
            .map(|name| name.as_ref().to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();

        let (mut found, misses) = self.cache.partition(&wanted);
        debug!("{} of {} names served from cache", found.len(), wanted.len());

        if !misses.is_empty() {
            // Another caller may have fetched some of these while we waited
            let _fill = self.cache.fill_guard().await;
            let (filled, misses) = self.cache.partition(&misses);
            found.extend(filled);

            if !misses.is_empty() {
                let fetched = self.fetch_info(&misses).await?;
                self.cache.insert_many(fetched.iter().cloned());
                found.extend(fetched);
            }
        }

        let found_names: HashSet<&str> = found.iter().map(|pkg| pkg.name.as_str()).collect();
        let not_found = wanted
            .iter()
            .filter(|name| !found_names.contains(name.as_str()))
            .cloned()
            .collect();

        Ok(LookupResult { found, not_found })
    }

    /// Fetch records for `names` in concurrent info requests
    ///
    /// Fails as a whole if any single request fails.
    async fn fetch_info(&self, names: &[String]) -> Result<Vec<AurPackage>> {
        let tasks: Vec<_> = names
            .chunks(self.info_batch_size)
            .enumerate()
            .map(|(idx, chunk)| (idx, self.execute(AurQuery::Info(chunk.to_vec()))))
            .collect();
        info!("Requesting {} names in {} info requests", names.len(), tasks.len());

        let results = pool::run_concurrent(tasks, 0).await?;
        Ok(results.into_values().flatten().collect())
    }

    /// Enumerate the whole AUR catalog
    ///
    /// The first successful call populates the cache; every later call
    /// returns the cached map without touching the network. Concurrent
    /// first calls share a single enumeration.
    pub async fn list_catalog(&self) -> Result<Arc<Catalog>> {
        if let Some(catalog) = self.cache.catalog() {
            debug!("Catalog served from cache ({} packages)", catalog.len());
            return Ok(catalog);
        }

        self.cache
            .catalog_or_try_init(|| self.enumerate_catalog())
            .await
    }

    async fn enumerate_catalog(&self) -> Result<Catalog> {
        let tasks: Vec<_> = catalog_search_terms()
            .into_iter()
            .map(|term| (term.clone(), self.execute(AurQuery::Search(term))))
            .collect();
        info!(
            "Enumerating AUR catalog with {} searches, {} in flight",
            tasks.len(),
            self.catalog_concurrency
        );

        let results = pool::run_concurrent(tasks, self.catalog_concurrency).await?;

        let mut catalog = Catalog::new();
        for pkg in results.into_values().flatten() {
            catalog.insert(pkg.name.clone(), pkg);
        }
        info!("AUR catalog holds {} packages", catalog.len());

        Ok(catalog)
    }

    /// Run one query and decode its results
    async fn execute(&self, query: AurQuery) -> Result<Vec<AurPackage>> {
        let result = self.transport.fetch(&query.path()).await?;
        decode_results(result)
    }
}

/// Extract package records from an RPC response
fn decode_results(result: QueryResult) -> Result<Vec<AurPackage>> {
    let status = result.status_code().to_string();
    let success = result.is_success();
    let body = result.into_body();

    let response: RpcResponse =
        serde_json::from_value(body.clone()).map_err(|source| Error::InvalidPayload {
            text: body.to_string(),
            source,
        })?;

    if let Some(message) = response.error {
        return Err(Error::Rpc(message));
    }
    if !success {
        return Err(Error::Rpc(format!("HTTP {}", status)));
    }

    debug!(
        "Decoded {} results from {} response",
        response.results.len(),
        response.response_type.as_deref().unwrap_or("untyped")
    );
    Ok(response.results)
}
