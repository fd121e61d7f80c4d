// src/packages/mod.rs

//! Package record abstractions
//!
//! Every source of package metadata (the AUR RPC, the local database, sync
//! repositories) implements the `PackageRecord` trait so the resolver can
//! treat them uniformly.

pub mod traits;

pub use traits::PackageRecord;
