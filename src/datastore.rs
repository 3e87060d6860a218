//! Datastore Facade Module
//!
//! The entry point the rest of the gateway uses. Each operation
//! consults the local store first, then resolves the replica set for
//! the key and dispatches through the behavior matching the verb.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::CacheStore;
use crate::cluster::{resolve, ClusterNode};
use crate::config::Config;
use crate::error::Result;
use crate::remote::{CombinedResult, ProxyTransport, RemoteBehavior, RemoteCommand, RemoteOutcome};

// == Datastore ==
/// Cluster-wide key/value cache facade.
///
/// Collaborators arrive through the constructor: the local store, the
/// outbound transport and the membership snapshot holder. Nothing here
/// reaches into globals, which is what makes the facade testable with
/// scripted transports.
pub struct Datastore {
    local: Arc<RwLock<CacheStore>>,
    membership: Arc<RwLock<Vec<ClusterNode>>>,
    transport: Arc<dyn ProxyTransport>,
    replication_factor: usize,
    quorum_size: usize,
    per_call_timeout: Duration,
}

impl Datastore {
    // == Constructor ==
    /// Wires a facade from its collaborators and tuning parameters.
    pub fn new(
        local: Arc<RwLock<CacheStore>>,
        membership: Arc<RwLock<Vec<ClusterNode>>>,
        transport: Arc<dyn ProxyTransport>,
        config: &Config,
    ) -> Self {
        Self {
            local,
            membership,
            transport,
            replication_factor: config.replication_factor,
            quorum_size: config.quorum_size,
            per_call_timeout: Duration::from_millis(config.per_call_timeout_ms),
        }
    }

    /// The local store behind this facade.
    pub fn local(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.local)
    }

    // == Get ==
    /// Fetches the value for a key. A local hit short-circuits; on a
    /// local miss the replica set is walked serially and the first
    /// reachable authority's answer, hit or miss, settles it.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.local.write().await.get(key) {
            debug!(key, "Local cache hit");
            return Ok(Some(entry.value));
        }

        let command = RemoteCommand::Get {
            key: key.to_string(),
        };
        let result = self.dispatch(&command).await?;

        match result.outcome {
            RemoteOutcome::Value(value) => {
                // Write the fetched value through so the next get for
                // this key is a local hit. The wire carries no
                // remaining TTL for reads, so the local copy lives for
                // the store's default TTL. Best effort: a full local
                // store must not fail a read the cluster answered.
                if let Err(err) =
                    self.local
                        .write()
                        .await
                        .put(key.to_string(), value.clone(), None)
                {
                    debug!(key, "Write-through after remote get failed: {}", err);
                }
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    // == Put ==
    /// Replicates a value to the key's replica set and, once a quorum
    /// has acknowledged, writes it through into the local store.
    pub async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
    ) -> Result<CombinedResult> {
        let ttl = match ttl_seconds {
            Some(ttl) => ttl,
            None => self.local.read().await.default_ttl(),
        };

        let command = RemoteCommand::Put {
            key: key.to_string(),
            value: value.clone(),
            ttl_seconds: ttl,
        };
        let result = self.dispatch(&command).await?;

        if result.is_positive() {
            self.local
                .write()
                .await
                .put(key.to_string(), value, Some(ttl))?;
        }
        Ok(result)
    }

    // == Delete ==
    /// Removes a key across its replica set and invalidates the local
    /// copy. Deleting an absent key is a valid result, not an error.
    pub async fn delete(&self, key: &str) -> Result<CombinedResult> {
        let command = RemoteCommand::Delete {
            key: key.to_string(),
        };
        let result = self.dispatch(&command).await?;

        if result.is_positive() {
            self.local.write().await.invalidate(key);
        }
        Ok(result)
    }

    // == Patch ==
    /// Applies a signed delta to the counter under a key across its
    /// replica set, writing the resulting value through locally. A
    /// `Conflict` result means the caller must re-read and retry.
    pub async fn patch(&self, key: &str, delta: i64) -> Result<CombinedResult> {
        let command = RemoteCommand::Patch {
            key: key.to_string(),
            delta,
        };
        let result = self.dispatch(&command).await?;

        if let Some(counter) = result.counter() {
            self.local
                .write()
                .await
                .put(key.to_string(), counter.to_string().into_bytes(), None)?;
        }
        Ok(result)
    }

    // == Dispatch ==
    /// Resolves the replica set under the current membership snapshot
    /// and runs the command through the behavior for its verb.
    async fn dispatch(&self, command: &RemoteCommand) -> Result<CombinedResult> {
        let membership = self.membership.read().await.clone();
        let replicas = resolve(command.key(), self.replication_factor, &membership)?;
        let behavior = RemoteBehavior::for_command(command, self.quorum_size);

        debug!(
            key = command.key(),
            replicas = replicas.len(),
            ?behavior,
            "Dispatching remote command"
        );

        behavior
            .execute(
                command,
                &replicas,
                Arc::clone(&self.transport),
                self.per_call_timeout,
            )
            .await
    }
}
