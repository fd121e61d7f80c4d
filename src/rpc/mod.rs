// src/rpc/mod.rs

//! Minimal HTTP-over-TLS plumbing for the AUR RPC endpoint
//!
//! This module provides:
//! - A wire codec that turns a raw HTTP response into a `QueryResult`
//! - A TLS client that frames GET requests by hand over a raw TCP socket
//! - The `RpcTransport` trait the batch query layer is written against

pub mod client;
pub mod codec;

pub use client::RpcClient;
pub use codec::QueryResult;

use crate::error::Result;
use async_trait::async_trait;

/// A transport able to execute one RPC GET request
///
/// `RpcClient` is the production implementation; tests provide scripted
/// in-memory transports.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Host the requests are sent to
    fn host(&self) -> &str;

    /// Issue a GET for `path` (already query-encoded) and decode the response
    async fn fetch(&self, path: &str) -> Result<QueryResult>;
}
