// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod cache;
pub mod dependency_graph;
pub mod metrics;
pub mod node;
pub mod priority_work_queue;
pub mod result;
pub mod unified;
pub mod worker_pool;

pub use cache::{DedupCache, Evicted, PutOutcome};
pub use dependency_graph::DependencyGraph;
pub use metrics::EngineMetrics;
pub use node::{ContentHash, DataNode, NodeId, NodeState, Priority};
pub use priority_work_queue::{PrioritizedTask, PriorityWorkQueue};
pub use result::{CachedOutput, ProcessingResult};
pub use unified::UnifiedEngine;
pub use worker_pool::PoolKind;
