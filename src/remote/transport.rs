//! Proxy Transport Module
//!
//! The seam between the remote protocol and the wire: one trait for
//! "send this request to that peer", with a reqwest-backed production
//! implementation. Tests inject scripted implementations instead.

use async_trait::async_trait;
use std::time::Duration;

use crate::cluster::ClusterNode;
use crate::error::{DatastoreError, Result};

// == Peer Request ==
/// One HTTP request against a single peer, built by a remote command.
#[derive(Debug, Clone)]
pub struct PeerRequest {
    /// HTTP method name (GET/PUT/DELETE/PATCH)
    pub method: &'static str,
    /// Path under the peer's base URL, e.g. `/cache/some-key`
    pub path: String,
    /// Per-command headers, replication marker included
    pub headers: Vec<(&'static str, String)>,
    /// Request body, if the verb carries one
    pub body: Option<Vec<u8>>,
}

// == Peer Response ==
/// The raw result of one command execution against one peer.
#[derive(Debug, Clone)]
pub struct PeerResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body bytes
    pub body: Vec<u8>,
}

// == Proxy Transport Trait ==
/// Executes one HTTP call against one peer.
///
/// Implementations return `Transport` errors for anything that
/// prevents a round trip (refused connection, timeout); a completed
/// round trip with an unhappy status code is still an `Ok` response,
/// interpreting it is the command's job.
#[async_trait]
pub trait ProxyTransport: Send + Sync + 'static {
    async fn send(&self, node: &ClusterNode, request: PeerRequest) -> Result<PeerResponse>;
}

// == HTTP Proxy Transport ==
/// Production transport over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProxyTransport {
    client: reqwest::Client,
}

impl HttpProxyTransport {
    /// Creates a transport whose calls are bounded by `per_call_timeout`.
    pub fn new(per_call_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(per_call_timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

#[async_trait]
impl ProxyTransport for HttpProxyTransport {
    async fn send(&self, node: &ClusterNode, request: PeerRequest) -> Result<PeerResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            DatastoreError::Transport {
                node: node.clone(),
                reason: e.to_string(),
            }
        })?;
        let url = format!("{}{}", node.base_url(), request.path);

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| DatastoreError::Transport {
            node: node.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DatastoreError::Transport {
                node: node.clone(),
                reason: e.to_string(),
            })?
            .to_vec();

        Ok(PeerResponse { status, body })
    }
}
