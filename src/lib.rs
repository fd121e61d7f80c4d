// src/lib.rs

//! Aurum: AUR helper core
//!
//! Talks to the AUR metadata service and works out whether a set of new
//! repository and AUR packages can be installed next to what is already on
//! the system.
//!
//! # Architecture
//!
//! - `rpc`: minimal HTTP/1.1 over TLS client with its own response parser
//! - `aur`: batched, concurrent, cached queries on top of the RPC client
//! - `db`: installed packages and sync repositories read from pacman's dbpath
//! - `resolver`: conflict and replacement analysis for a transaction
//! - `version`: pacman version ordering and dependency-line predicates

pub mod aur;
pub mod config;
pub mod db;
mod error;
pub mod packages;
pub mod pool;
pub mod resolver;
pub mod rpc;
pub mod version;

pub use error::{Error, Result};
