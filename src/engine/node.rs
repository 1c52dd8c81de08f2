// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data node descriptors: the unit of work the engine schedules.
//!
//! A [`DataNode`] is built by an upstream adapter (an ingested post, a payment
//! transaction, a metrics row) and handed to the engine. After submission only
//! the engine's coordinator mutates it; worker units receive an immutable
//! snapshot.
//!
//! # Examples
//!
//! ```rust
//! use unified_engine::engine::{DataNode, Priority, ContentHash};
//!
//! let node = DataNode::new("post-42", "twitter", Priority::High)
//!     .with_content_hash(ContentHash::digest(b"hello world"))
//!     .with_dependency("account-7")
//!     .with_metadata("lang", serde_json::json!("en"));
//!
//! assert_eq!(node.dependencies.len(), 1);
//! assert_eq!(node.priority.ordinal(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::engine::worker_pool::PoolKind;

/// Caller-assigned node identifier.
pub type NodeId = String;

/// Scheduling class. Lower ordinal is popped first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical = 0,
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
}

impl Priority {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Worker pool a node of this class is dispatched to.
    ///
    /// Critical and High go to the latency-oriented I/O pool; Medium and Low go
    /// to the throughput-oriented CPU pool.
    pub fn pool_kind(self) -> PoolKind {
        match self {
            Priority::Critical | Priority::High => PoolKind::Io,
            Priority::Medium | Priority::Low => PoolKind::Cpu,
        }
    }
}

/// Lifecycle of a node inside the engine.
///
/// ```text
/// Pending --(cache hit)--> Cached
/// Pending --(dispatched)--> Processing --(ok)--> Completed
///                                      --(err)--> Failed
/// Pending | Processing --(cancel)--> Cancelled
/// ```
///
/// Cached, Completed, Failed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Pending,
    Processing,
    Completed,
    Failed,
    Cached,
    Cancelled,
}

impl NodeState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, NodeState::Pending | NodeState::Processing)
    }
}

/// Hex digest of a node's logical content, used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a digest computed elsewhere.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// BLAKE3 digest of raw bytes.
    pub fn digest(bytes: impl AsRef<[u8]>) -> Self {
        Self(blake3::hash(bytes.as_ref()).to_hex().to_string())
    }

    /// BLAKE3 digest of the canonical JSON encoding of `value`.
    pub fn of_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::digest(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One schedulable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataNode {
    pub id: NodeId,
    pub content_hash: ContentHash,
    pub source_type: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub dependencies: BTreeSet<NodeId>,
    #[serde(default = "pending")]
    pub state: NodeState,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn pending() -> NodeState {
    NodeState::Pending
}

impl DataNode {
    /// Create a pending node with no dependencies.
    ///
    /// The content hash defaults to the digest of the id, which makes every
    /// node unique until a real content hash is supplied.
    pub fn new(id: impl Into<NodeId>, source_type: impl Into<String>, priority: Priority) -> Self {
        let id = id.into();
        let content_hash = ContentHash::digest(id.as_bytes());
        Self {
            id,
            content_hash,
            source_type: source_type.into(),
            priority,
            dependencies: BTreeSet::new(),
            state: NodeState::Pending,
            metadata: HashMap::new(),
        }
    }

    pub fn with_content_hash(mut self, content_hash: ContentHash) -> Self {
        self.content_hash = content_hash;
        self
    }

    pub fn with_dependency(mut self, dependency: impl Into<NodeId>) -> Self {
        self.dependencies.insert(dependency.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordinals_and_pools() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!(Priority::Low.ordinal(), 3);
        assert_eq!(Priority::default(), Priority::Medium);

        assert_eq!(Priority::Critical.pool_kind(), PoolKind::Io);
        assert_eq!(Priority::High.pool_kind(), PoolKind::Io);
        assert_eq!(Priority::Medium.pool_kind(), PoolKind::Cpu);
        assert_eq!(Priority::Low.pool_kind(), PoolKind::Cpu);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!NodeState::Pending.is_terminal());
        assert!(!NodeState::Processing.is_terminal());
        assert!(NodeState::Completed.is_terminal());
        assert!(NodeState::Failed.is_terminal());
        assert!(NodeState::Cached.is_terminal());
        assert!(NodeState::Cancelled.is_terminal());
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = ContentHash::digest(b"same payload");
        let b = ContentHash::digest(b"same payload");
        let c = ContentHash::digest(b"other payload");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_json_hash_ignores_construction_path() {
        let a = ContentHash::of_json(&serde_json::json!({"k": 1})).unwrap();
        let b = ContentHash::of_json(&serde_json::json!({"k": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_hash_differs_per_id() {
        let a = DataNode::new("a", "feed", Priority::Low);
        let b = DataNode::new("b", "feed", Priority::Low);
        assert_ne!(a.content_hash, b.content_hash);
        assert_eq!(a.state, NodeState::Pending);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let node: DataNode = serde_json::from_value(serde_json::json!({
            "id": "row-1",
            "content_hash": "abc",
            "source_type": "metrics",
            "dependencies": ["row-0"]
        }))
        .unwrap();

        assert_eq!(node.priority, Priority::Medium);
        assert_eq!(node.state, NodeState::Pending);
        assert!(node.dependencies.contains("row-0"));
        assert_eq!(node.content_hash, ContentHash::from("abc"));
    }
}
