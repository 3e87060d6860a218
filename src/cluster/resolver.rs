//! Node Resolver Module
//!
//! Maps a cache key to the ordered list of peers responsible for it.
//!
//! Uses rendezvous (highest-random-weight) hashing: every node in the
//! membership snapshot is scored against the key and the top
//! `replication_factor` nodes, highest score first, form the replica
//! set. No ring state is kept between calls, so membership changes
//! between operations are picked up automatically and resolution stays
//! deterministic for any fixed snapshot.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::cluster::ClusterNode;
use crate::error::{DatastoreError, Result};

/// Ordered peers responsible for one key, primary first.
pub type ReplicaSet = Vec<ClusterNode>;

// == Resolve ==
/// Resolves the replica set for `key` under the given membership
/// snapshot.
///
/// Deterministic: the same key and the same snapshot always yield the
/// same ordered set. The set is capped at the membership size and never
/// contains duplicates.
///
/// # Errors
/// `EmptyCluster` when the membership snapshot is empty.
pub fn resolve(
    key: &str,
    replication_factor: usize,
    membership: &[ClusterNode],
) -> Result<ReplicaSet> {
    if membership.is_empty() {
        return Err(DatastoreError::EmptyCluster);
    }

    let mut scored: Vec<(u64, &ClusterNode)> = membership
        .iter()
        .map(|node| (weight(key, node), node))
        .collect();

    // Highest weight first; ties broken by node identity so that equal
    // scores still order deterministically.
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.host.cmp(&b.1.host))
            .then_with(|| a.1.port.cmp(&b.1.port))
    });

    let count = replication_factor.clamp(1, membership.len());
    Ok(scored
        .into_iter()
        .take(count)
        .map(|(_, node)| node.clone())
        .collect())
}

// == Weight ==
/// Rendezvous score of one node for one key.
fn weight(key: &str, node: &ClusterNode) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    node.host.hash(&mut hasher);
    node.port.hash(&mut hasher);
    hasher.finish()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn membership(n: usize) -> Vec<ClusterNode> {
        (0..n)
            .map(|i| ClusterNode::new(format!("cache-{}", i), 8080))
            .collect()
    }

    #[test]
    fn test_resolve_empty_membership() {
        let result = resolve("key", 2, &[]);
        assert!(matches!(result, Err(DatastoreError::EmptyCluster)));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let nodes = membership(5);
        let first = resolve("session:42", 3, &nodes).unwrap();
        let second = resolve("session:42", 3, &nodes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_caps_at_membership_size() {
        let nodes = membership(2);
        let replicas = resolve("key", 5, &nodes).unwrap();
        assert_eq!(replicas.len(), 2);
    }

    #[test]
    fn test_resolve_no_duplicates() {
        let nodes = membership(4);
        let replicas = resolve("key", 4, &nodes).unwrap();
        let mut seen = replicas.clone();
        seen.dedup();
        assert_eq!(seen.len(), replicas.len());
    }

    #[test]
    fn test_resolve_zero_factor_still_returns_primary() {
        let nodes = membership(3);
        let replicas = resolve("key", 0, &nodes).unwrap();
        assert_eq!(replicas.len(), 1);
    }

    #[test]
    fn test_resolve_ignores_membership_order() {
        // Rendezvous hashing scores nodes independently, so shuffling
        // the snapshot must not change the resulting order.
        let nodes = membership(5);
        let mut reversed = nodes.clone();
        reversed.reverse();

        let a = resolve("rate:10.0.0.1", 3, &nodes).unwrap();
        let b = resolve("rate:10.0.0.1", 3, &reversed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_spreads_keys_across_nodes() {
        let nodes = membership(5);
        let mut primaries = std::collections::HashSet::new();
        for i in 0..100 {
            let replicas = resolve(&format!("key-{}", i), 1, &nodes).unwrap();
            primaries.insert(replicas[0].clone());
        }
        // 100 keys over 5 nodes should hit more than one primary
        assert!(primaries.len() > 1);
    }
}

// == Property Tests ==
#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn key_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_:.-]{1,64}"
    }

    fn membership_strategy() -> impl Strategy<Value = Vec<ClusterNode>> {
        prop::collection::hash_set("[a-z]{1,12}", 1..10).prop_map(|hosts| {
            hosts
                .into_iter()
                .map(|h| ClusterNode::new(h, 8080))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_resolution_is_deterministic(
            key in key_strategy(),
            nodes in membership_strategy(),
            factor in 1usize..6,
        ) {
            let first = resolve(&key, factor, &nodes).unwrap();
            let second = resolve(&key, factor, &nodes).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_replica_set_is_capped_and_nonempty(
            key in key_strategy(),
            nodes in membership_strategy(),
            factor in 1usize..12,
        ) {
            let replicas = resolve(&key, factor, &nodes).unwrap();
            prop_assert!(!replicas.is_empty());
            prop_assert!(replicas.len() <= nodes.len());
            prop_assert!(replicas.len() <= factor);
        }

        #[test]
        fn prop_replicas_drawn_from_membership(
            key in key_strategy(),
            nodes in membership_strategy(),
            factor in 1usize..6,
        ) {
            let replicas = resolve(&key, factor, &nodes).unwrap();
            for replica in &replicas {
                prop_assert!(nodes.contains(replica));
            }
        }

        #[test]
        fn prop_surviving_replicas_keep_relative_order(
            key in key_strategy(),
            nodes in membership_strategy(),
        ) {
            // Removing one node must not reorder the replicas that
            // remain (the rendezvous property that limits reshuffling).
            prop_assume!(nodes.len() >= 3);
            let full = resolve(&key, nodes.len(), &nodes).unwrap();

            let shrunk: Vec<ClusterNode> =
                nodes.iter().skip(1).cloned().collect();
            let after = resolve(&key, shrunk.len(), &shrunk).unwrap();

            let expected: Vec<ClusterNode> = full
                .into_iter()
                .filter(|n| *n != nodes[0])
                .collect();
            prop_assert_eq!(after, expected);
        }
    }
}
