// src/rpc/client.rs

//! TLS client for the AUR RPC endpoint
//!
//! Requests are framed by hand and written to a rustls stream on top of a
//! plain tokio `TcpStream`. The response is read until the server closes the
//! connection and then handed to the codec.

use super::codec::{self, QueryResult};
use super::RpcTransport;
use crate::config::AurSection;
use crate::error::{Error, Result};
use async_trait::async_trait;
use rustls_pki_types::ServerName;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::debug;

/// RPC client speaking HTTP/1.1 over TLS
pub struct RpcClient {
    host: String,
    port: u16,
    user_agent: String,
    timeout: Duration,
    connector: TlsConnector,
}

impl RpcClient {
    /// Create a client from the `[aur]` configuration section
    pub fn new(config: &AurSection) -> Result<Self> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
        let tls_config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(format!("Failed to configure TLS: {}", e)))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout(),
            connector: TlsConnector::from(Arc::new(tls_config)),
        })
    }

    /// Connect, send one request and collect the raw response
    async fn fetch_raw(&self, path: &str) -> Result<Vec<u8>> {
        let tcp = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                Error::Network(format!("Failed to connect to {}:{}: {}", self.host, self.port, e))
            })?;

        let server_name = ServerName::try_from(self.host.clone())
            .map_err(|e| Error::Tls(format!("Invalid server name '{}': {}", self.host, e)))?;

        let tls = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| Error::Tls(format!("TLS handshake with {} failed: {}", self.host, e)))?;

        let request = build_request(&self.host, path, &self.user_agent);
        exchange(tls, &request).await
    }
}

#[async_trait]
impl RpcTransport for RpcClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn fetch(&self, path: &str) -> Result<QueryResult> {
        debug!("GET https://{}{}", self.host, path);

        let raw = tokio::time::timeout(self.timeout, self.fetch_raw(path))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;

        debug!("Received {} bytes from {}", raw.len(), self.host);
        codec::parse(&raw)
    }
}

/// Frame a GET request exactly as the metadata service expects it
///
/// The trailing NUL byte is part of the established request format.
pub fn build_request(host: &str, path: &str, user_agent: &str) -> Vec<u8> {
    let lines = [
        format!("GET {} HTTP/1.1", path),
        format!("Host: {}", host),
        "Content-type: application/json".to_string(),
        format!("User-Agent: {}", user_agent),
        "Accept: */*".to_string(),
        String::new(),
        String::new(),
    ];

    let mut request = lines.join("\r\n").into_bytes();
    request.push(0);
    request
}

/// Write the request, read until EOF, then close the write side
async fn exchange<S>(mut stream: S, request: &[u8]) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(request)
        .await
        .map_err(|e| Error::Network(format!("Failed to send request: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| Error::Network(format!("Failed to send request: {}", e)))?;

    let mut raw = Vec::new();
    match stream.read_to_end(&mut raw).await {
        Ok(_) => {}
        // Servers commonly drop the socket without a TLS close_notify
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            debug!("Connection closed without close_notify after {} bytes", raw.len());
        }
        Err(e) => {
            return Err(Error::Network(format!("Failed to read response: {}", e)));
        }
    }

    if let Err(e) = stream.shutdown().await {
        debug!("Ignoring shutdown error: {}", e);
    }

    Ok(raw)
}
