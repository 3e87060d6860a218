//! Remote Behavior Module
//!
//! Strategies that turn one command plus a replica set into a single
//! combined result. Two policies exist: serial first-success for reads
//! and concurrent fan-out with a quorum for writes. Both absorb
//! per-peer failures; only the combined outcome leaves this module.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cluster::{ClusterNode, ReplicaSet};
use crate::error::{DatastoreError, Result};
use crate::remote::command::{RemoteCommand, RemoteOutcome};
use crate::remote::transport::ProxyTransport;

// == Combined Result ==
/// The behavior's reduction of one or more peer responses.
#[derive(Debug, Clone)]
pub struct CombinedResult {
    /// The decoded outcome the caller acts on
    pub outcome: RemoteOutcome,
    /// Peers that were unreachable or did not positively acknowledge
    /// while this operation ran, kept for observability
    pub failed_nodes: Vec<ClusterNode>,
}

impl CombinedResult {
    /// The fetched value, for read results.
    pub fn value(&self) -> Option<&[u8]> {
        match &self.outcome {
            RemoteOutcome::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The updated counter, for patch results.
    pub fn counter(&self) -> Option<i64> {
        match self.outcome {
            RemoteOutcome::Counter(value) => Some(value),
            _ => None,
        }
    }

    /// True when the combined outcome is a positive answer.
    pub fn is_positive(&self) -> bool {
        self.outcome.is_positive()
    }
}

// == Remote Behavior ==
/// Fan-out policy for one operation. Stateless: quorum and timeout are
/// explicit parameters, nothing is captured between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteBehavior {
    /// Contact replicas one at a time in order; the first well-formed
    /// answer (positive or negative) wins
    FirstSuccess,
    /// Contact every replica concurrently; succeed once this many
    /// individual positive answers arrive
    Quorum(usize),
}

impl RemoteBehavior {
    // == Selection ==
    /// Picks the policy for a command: serial for reads, quorum
    /// fan-out for writes. Pure function of verb and configured quorum.
    pub fn for_command(command: &RemoteCommand, quorum: usize) -> Self {
        match command {
            RemoteCommand::Get { .. } => RemoteBehavior::FirstSuccess,
            RemoteCommand::Put { .. }
            | RemoteCommand::Delete { .. }
            | RemoteCommand::Patch { .. } => RemoteBehavior::Quorum(quorum),
        }
    }

    // == Execute ==
    /// Runs the command against the replica set under this policy.
    pub async fn execute(
        &self,
        command: &RemoteCommand,
        replicas: &ReplicaSet,
        transport: Arc<dyn ProxyTransport>,
        per_call_timeout: Duration,
    ) -> Result<CombinedResult> {
        if replicas.is_empty() {
            return Err(DatastoreError::EmptyCluster);
        }

        match self {
            RemoteBehavior::FirstSuccess => {
                first_success(command, replicas, transport, per_call_timeout).await
            }
            RemoteBehavior::Quorum(quorum) => {
                fan_out(command, replicas, transport, per_call_timeout, *quorum).await
            }
        }
    }
}

// == Serial First-Success ==
/// Walks the replica set in order, one call at a time. Transport and
/// protocol failures advance to the next node; any well-formed answer,
/// a miss included, stops the walk. Nothing past the answering node is
/// ever contacted.
async fn first_success(
    command: &RemoteCommand,
    replicas: &ReplicaSet,
    transport: Arc<dyn ProxyTransport>,
    per_call_timeout: Duration,
) -> Result<CombinedResult> {
    let mut failed_nodes = Vec::new();

    for node in replicas {
        match call_peer(command, node, transport.as_ref(), per_call_timeout).await {
            Ok(outcome) => {
                debug!(node = %node, key = command.key(), "Peer answered");
                return Ok(CombinedResult {
                    outcome,
                    failed_nodes,
                });
            }
            Err(err) if err.is_peer_failure() => {
                log_peer_failure(&err);
                failed_nodes.push(node.clone());
            }
            Err(err) => return Err(err),
        }
    }

    Err(DatastoreError::AllReplicasFailed {
        attempted: failed_nodes,
    })
}

// == Fan-Out With Quorum ==
/// Issues the command to every replica concurrently and collects
/// answers as they land. The wait ends as soon as `quorum` positive
/// answers are in, at which point outstanding calls are aborted
/// best-effort, or when every call has completed.
async fn fan_out(
    command: &RemoteCommand,
    replicas: &ReplicaSet,
    transport: Arc<dyn ProxyTransport>,
    per_call_timeout: Duration,
    quorum: usize,
) -> Result<CombinedResult> {
    // A quorum larger than the replica set could never be met; a
    // degraded cluster still takes writes on what remains.
    let required = quorum.clamp(1, replicas.len());

    let mut tasks: JoinSet<(ClusterNode, Result<RemoteOutcome>)> = JoinSet::new();
    for node in replicas.clone() {
        let command = command.clone();
        let transport = Arc::clone(&transport);
        tasks.spawn(async move {
            let result = call_peer(&command, &node, transport.as_ref(), per_call_timeout).await;
            (node, result)
        });
    }

    let mut successes = 0usize;
    let mut combined: Option<RemoteOutcome> = None;
    let mut failed_nodes = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        let (node, result) = match joined {
            Ok(pair) => pair,
            // An aborted or panicked peer task counts for nothing;
            // the nodes it covered are unknowable here.
            Err(_) => continue,
        };

        match result {
            Ok(outcome) if outcome.is_positive() => {
                successes += 1;
                let merged = reduce(combined.take(), outcome);
                if successes >= required {
                    return Ok(settle_quorum(tasks, merged, failed_nodes));
                }
                combined = Some(merged);
            }
            Ok(_) => {
                // Well-formed negative answer: the peer did not take
                // the write, so it counts against quorum like a
                // failure does.
                debug!(node = %node, key = command.key(), "Peer answered negatively");
                failed_nodes.push(node);
            }
            Err(DatastoreError::Conflict(key)) => {
                tasks.abort_all();
                return Err(DatastoreError::Conflict(key));
            }
            Err(err) => {
                log_peer_failure(&err);
                failed_nodes.push(node);
            }
        }
    }

    Err(DatastoreError::PartialWrite {
        required,
        successes,
        failed: failed_nodes,
    })
}

/// Closes out a fan-out once quorum is met: peers that have already
/// finished are still collected, so a failure that resolved before the
/// quorum did shows up in `failed_nodes`, then the stragglers are
/// abandoned.
fn settle_quorum(
    mut tasks: JoinSet<(ClusterNode, Result<RemoteOutcome>)>,
    mut combined: RemoteOutcome,
    mut failed_nodes: Vec<ClusterNode>,
) -> CombinedResult {
    while let Some(joined) = tasks.try_join_next() {
        let (node, result) = match joined {
            Ok(pair) => pair,
            Err(_) => continue,
        };

        match result {
            Ok(outcome) if outcome.is_positive() => {
                combined = reduce(Some(combined), outcome);
            }
            Ok(_) => failed_nodes.push(node),
            Err(err) => {
                log_peer_failure(&err);
                failed_nodes.push(node);
            }
        }
    }
    tasks.abort_all();

    CombinedResult {
        outcome: combined,
        failed_nodes,
    }
}

/// Merges a new positive outcome into the running combined outcome.
/// Counters keep the maximum observed value (they only grow); every
/// other outcome kind keeps the first answer.
fn reduce(current: Option<RemoteOutcome>, incoming: RemoteOutcome) -> RemoteOutcome {
    match (current, incoming) {
        (Some(RemoteOutcome::Counter(a)), RemoteOutcome::Counter(b)) => {
            RemoteOutcome::Counter(a.max(b))
        }
        (Some(existing), _) => existing,
        (None, incoming) => incoming,
    }
}

// == Single Peer Call ==
/// One command execution against one peer: transport send bounded by
/// the per-call timeout, then the command's pure decode step.
async fn call_peer(
    command: &RemoteCommand,
    node: &ClusterNode,
    transport: &dyn ProxyTransport,
    per_call_timeout: Duration,
) -> Result<RemoteOutcome> {
    let response = tokio::time::timeout(per_call_timeout, transport.send(node, command.request()))
        .await
        .map_err(|_| DatastoreError::Transport {
            node: node.clone(),
            reason: format!("timed out after {:?}", per_call_timeout),
        })??;

    command.decode(node, &response)
}

/// Transport failures are expected noise; protocol failures mean a
/// peer is misbehaving and deserve a louder line.
fn log_peer_failure(err: &DatastoreError) {
    match err {
        DatastoreError::Protocol { .. } => warn!("{}", err),
        _ => debug!("{}", err),
    }
}
