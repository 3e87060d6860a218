//! API Handlers
//!
//! HTTP request handlers for the peer wire protocol and the admin
//! endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::RwLock;

use crate::cluster::ClusterNode;
use crate::datastore::Datastore;
use crate::error::{DatastoreError, Result};
use crate::models::{HealthResponse, StatsResponse};
use crate::remote::{REPLICATION_MARKER, TTL_HEADER};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The datastore facade (local store + remote protocol)
    pub datastore: Arc<Datastore>,
    /// Current cluster membership snapshot
    pub membership: Arc<RwLock<Vec<ClusterNode>>>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(datastore: Arc<Datastore>, membership: Arc<RwLock<Vec<ClusterNode>>>) -> Self {
        Self {
            datastore,
            membership,
        }
    }
}

/// True when the request is inter-node replication traffic. Marked
/// requests must not replicate further, otherwise nodes would forward
/// each other's writes forever.
fn is_replication(headers: &HeaderMap) -> bool {
    headers.contains_key(REPLICATION_MARKER)
}

/// TTL requested via the `x-ttl` header, if present and numeric.
fn requested_ttl(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(TTL_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Handler for GET /cache/:key
///
/// Replication traffic reads the local store only; client traffic goes
/// through the facade, which may consult peers on a local miss.
pub async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    if is_replication(&headers) {
        let entry = state.datastore.local().write().await.get(&key);
        return Ok(match entry {
            Some(entry) => (StatusCode::OK, entry.value).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        });
    }

    Ok(match state.datastore.get(&key).await? {
        Some(value) => (StatusCode::OK, value).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// Handler for PUT /cache/:key
///
/// Stores the raw request body under the key. Answers 201 once the
/// value is stored (locally for replication traffic, quorum-replicated
/// for client traffic).
pub async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let ttl = requested_ttl(&headers);

    if is_replication(&headers) {
        state
            .datastore
            .local()
            .write()
            .await
            .put(key, body.to_vec(), ttl)?;
        return Ok(StatusCode::CREATED);
    }

    state.datastore.put(&key, body.to_vec(), ttl).await?;
    Ok(StatusCode::CREATED)
}

/// Handler for DELETE /cache/:key
///
/// Always answers 202 Accepted, whether or not the key existed.
pub async fn delete_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    if is_replication(&headers) {
        state.datastore.local().write().await.invalidate(&key);
        return Ok(StatusCode::ACCEPTED);
    }

    state.datastore.delete(&key).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Handler for PATCH /cache/:key
///
/// The body carries a signed decimal delta; the response body carries
/// the resulting counter value. A stored value that is not a decimal
/// counter answers 412, which callers treat as a retryable conflict.
pub async fn patch_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let delta: i64 = std::str::from_utf8(&body)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            DatastoreError::InvalidRequest("Patch body must be a signed decimal delta".to_string())
        })?;

    let counter = if is_replication(&headers) {
        let ttl = requested_ttl(&headers);
        state
            .datastore
            .local()
            .write()
            .await
            .patch_counter(&key, delta, ttl)?
    } else {
        state
            .datastore
            .patch(&key, delta)
            .await?
            .counter()
            .ok_or_else(|| {
                DatastoreError::Internal("patch result carried no counter".to_string())
            })?
    };

    Ok((StatusCode::OK, counter.to_string()).into_response())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.datastore.local().read().await.stats();
    let peers = state.membership.read().await.len();

    Json(StatsResponse::new(
        stats.hits,
        stats.misses,
        stats.total_entries,
        peers,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::config::Config;
    use crate::remote::{PeerRequest, PeerResponse, ProxyTransport};
    use async_trait::async_trait;

    /// A transport for states whose operations must stay local; any
    /// outbound call is a test failure.
    struct NoTransport;

    #[async_trait]
    impl ProxyTransport for NoTransport {
        async fn send(&self, node: &ClusterNode, _request: PeerRequest) -> Result<PeerResponse> {
            panic!("unexpected outbound call to {}", node);
        }
    }

    fn replication_state() -> AppState {
        let membership = Arc::new(RwLock::new(Vec::new()));
        let local = Arc::new(RwLock::new(CacheStore::new(100, 300)));
        let datastore = Arc::new(Datastore::new(
            local,
            Arc::clone(&membership),
            Arc::new(NoTransport),
            &Config::default(),
        ));
        AppState::new(datastore, membership)
    }

    fn marked_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REPLICATION_MARKER, "node".parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_replicated_put_then_get_stays_local() {
        let state = replication_state();

        let status = put_object(
            State(state.clone()),
            Path("k".to_string()),
            marked_headers(),
            Bytes::from_static(b"v"),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let response = get_object(State(state), Path("k".to_string()), marked_headers())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_replicated_get_missing_key_is_404() {
        let state = replication_state();

        let response = get_object(State(state), Path("absent".to_string()), marked_headers())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_replicated_delete_is_accepted_even_when_absent() {
        let state = replication_state();

        let status = delete_object(State(state), Path("absent".to_string()), marked_headers())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_replicated_patch_returns_counter() {
        let state = replication_state();

        let response = patch_object(
            State(state),
            Path("hits".to_string()),
            marked_headers(),
            Bytes::from_static(b"3"),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_patch_garbage_delta_is_invalid_request() {
        let state = replication_state();

        let result = patch_object(
            State(state),
            Path("hits".to_string()),
            marked_headers(),
            Bytes::from_static(b"not a delta"),
        )
        .await;
        assert!(matches!(result, Err(DatastoreError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_ttl_header_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(TTL_HEADER, "120".parse().unwrap());
        assert_eq!(requested_ttl(&headers), Some(120));

        headers.insert(TTL_HEADER, "soon".parse().unwrap());
        assert_eq!(requested_ttl(&headers), None);
        assert_eq!(requested_ttl(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
