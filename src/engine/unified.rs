// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The orchestrator: owns every piece of scheduling state and advances it one
//! batch at a time.
//!
//! ## Single writer
//!
//! All mutating operations take `&mut self`. The queue, graph, node registry,
//! cache and metrics are therefore only ever touched by whoever holds the
//! engine, and the borrow checker rules out two batches applying results at
//! the same time. Worker units receive an `Arc<DataNode>` snapshot and hand
//! back a [`UnitOutcome`]; results are applied in [`UnifiedEngine::process_batch`]
//! after the units return.
//!
//! ## Node lifecycle
//!
//! ```text
//! submit ──(content cached)──────────────────────────────► Cached
//!    │
//!    └─► Pending ──(in-degree 0, popped)──► Processing ──► Completed
//!           │                                   │    └───► Failed
//!           └──────────(cancel)─────────────────┴────────► Cancelled
//! ```
//!
//! ## Example
//!
//! ```rust
//! use unified_engine::config::{EngineConfig, ProcessorMetadata};
//! use unified_engine::engine::{DataNode, NodeState, Priority, UnifiedEngine};
//!
//! # #[tokio::main(flavor = "multi_thread", worker_threads = 2)]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = UnifiedEngine::new(EngineConfig::default());
//! engine.register_fn(
//!     "rss",
//!     "rss_title",
//!     |node: &DataNode| Ok(serde_json::json!({ "id": node.id })),
//!     ProcessorMetadata::default(),
//! );
//!
//! engine.submit(DataNode::new("a", "rss", Priority::Medium))?;
//! engine.submit(DataNode::new("b", "rss", Priority::High).with_dependency("a"))?;
//!
//! let first = engine.process_batch(2).await;
//! assert_eq!(first.len(), 1);
//! let second = engine.process_batch(1).await;
//! assert_eq!(second[0].node_id, "b");
//! assert_eq!(engine.state("b"), Some(NodeState::Completed));
//!
//! let metrics = engine.shutdown().await;
//! assert_eq!(metrics.total_processed, 2);
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{EngineConfig, FailurePropagation, ProcessorMetadata, ProcessorRegistry};
use crate::engine::cache::{DedupCache, PutOutcome};
use crate::engine::dependency_graph::DependencyGraph;
use crate::engine::metrics::{EngineMetrics, Gauges, MetricsRecorder};
use crate::engine::node::{ContentHash, DataNode, NodeId, NodeState};
use crate::engine::priority_work_queue::{PrioritizedTask, PriorityWorkQueue};
use crate::engine::result::{CachedOutput, ProcessingResult};
use crate::engine::worker_pool::{DispatchUnit, PoolKind, UnitOutcome, WorkerPool};
use crate::errors::{EngineError, ProcessingError};
use crate::observability::messages::cache::{CacheEvicted, CacheWriteDeduplicated};
use crate::observability::messages::engine::{
    BatchCompleted, BatchDispatched, CyclicSubmissionRejected, EngineShutdown, FailureCascaded,
    NodeCancelled, NodeServedFromCache, NodeSubmitted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{FnProcessor, Processor};

/// A node the engine still owns: Pending or Processing.
#[derive(Debug)]
struct ActiveNode {
    node: DataNode,
    cancellation: CancellationToken,
}

/// A dispatched unit whose result has not been applied yet.
#[derive(Debug)]
struct InFlight {
    node_id: NodeId,
    pool: PoolKind,
    handle: JoinHandle<UnitOutcome>,
}

pub struct UnifiedEngine {
    config: EngineConfig,
    registry: ProcessorRegistry,
    queue: PriorityWorkQueue,
    graph: DependencyGraph,
    cache: DedupCache<CachedOutput>,
    active: HashMap<NodeId, ActiveNode>,
    completed: HashSet<NodeId>,
    failed: HashSet<NodeId>,
    cached: HashSet<NodeId>,
    // content each Cached node was served from; its output lives under another key
    served_from: HashMap<NodeId, ContentHash>,
    cancelled: HashSet<NodeId>,
    metrics: MetricsRecorder,
    io_pool: WorkerPool,
    cpu_pool: WorkerPool,
    in_flight: VecDeque<InFlight>,
    // results produced outside a batch (cascades triggered by cancel)
    deferred: Vec<ProcessingResult>,
}

impl UnifiedEngine {
    /// Create an engine with an empty processor registry.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, ProcessorRegistry::new())
    }

    pub fn with_registry(config: EngineConfig, registry: ProcessorRegistry) -> Self {
        Self {
            queue: PriorityWorkQueue::new(),
            graph: DependencyGraph::new(),
            cache: DedupCache::new(config.cache_capacity),
            active: HashMap::new(),
            completed: HashSet::new(),
            failed: HashSet::new(),
            cached: HashSet::new(),
            served_from: HashMap::new(),
            cancelled: HashSet::new(),
            metrics: MetricsRecorder::new(),
            io_pool: WorkerPool::new(PoolKind::Io, config.io_pool_size),
            cpu_pool: WorkerPool::new(PoolKind::Cpu, config.cpu_pool_size),
            in_flight: VecDeque::new(),
            deferred: Vec::new(),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Register a processor for `source_type`, replacing any previous one.
    pub fn register(
        &mut self,
        source_type: impl Into<String>,
        processor: Arc<dyn Processor>,
        metadata: ProcessorMetadata,
    ) {
        self.registry.register(source_type, processor, metadata);
    }

    /// Register a synchronous closure as the processor for `source_type`.
    pub fn register_fn<F>(
        &mut self,
        source_type: impl Into<String>,
        name: impl Into<String>,
        func: F,
        metadata: ProcessorMetadata,
    ) where
        F: Fn(&DataNode) -> anyhow::Result<serde_json::Value> + Send + Sync + 'static,
    {
        self.register(source_type, Arc::new(FnProcessor::new(name, func)), metadata);
    }

    /// Accept a node.
    ///
    /// If its content hash is already cached the node goes straight to
    /// Cached and anything waiting on it is unblocked. Otherwise it becomes
    /// Pending and is queued as soon as its in-degree is zero.
    pub fn submit(&mut self, mut node: DataNode) -> Result<NodeId, EngineError> {
        if self.active.contains_key(&node.id) {
            return Err(EngineError::DuplicateNode { node_id: node.id });
        }

        let submitted = NodeSubmitted {
            node_id: &node.id,
            source_type: &node.source_type,
            priority: node.priority.as_str(),
            dependency_count: node.dependencies.len(),
        };
        let span = submitted.span("submit");
        let _guard = span.enter();
        submitted.log();

        if let Some((cached_key, _)) = self.cache.get_by_content(&node.content_hash) {
            NodeServedFromCache {
                node_id: &node.id,
                content_hash: node.content_hash.as_str(),
                cached_key,
            }
            .log();

            self.metrics.record_cache_hit();
            self.forget_terminal(&node.id);
            self.cached.insert(node.id.clone());
            self.served_from
                .insert(node.id.clone(), node.content_hash.clone());
            let ready = self.graph.mark_completed(&node.id);
            self.enqueue_ready(ready);
            return Ok(node.id);
        }
        self.metrics.record_cache_miss();

        if self.config.reject_cycles {
            if let Some(cycle) = self.graph.find_cycle(&node.id, &node.dependencies) {
                CyclicSubmissionRejected {
                    node_id: &node.id,
                    cycle: &cycle,
                }
                .log();
                return Err(EngineError::CyclicDependency { cycle });
            }
        }

        let id = node.id.clone();
        self.forget_terminal(&id);
        // output from the id's previous lifecycle no longer describes it
        self.cache.remove(&id);
        self.graph.add_node(id.clone());

        let mut failed_dependency = None;
        for dep in &node.dependencies {
            if self.completed.contains(dep) || self.cached.contains(dep) {
                continue;
            }
            if self.config.failure_propagation == FailurePropagation::Cascade
                && (self.failed.contains(dep) || self.cancelled.contains(dep))
            {
                failed_dependency = Some(dep.clone());
                break;
            }
            self.graph.add_dependency(id.clone(), dep.clone());
        }

        if let Some(dependency) = failed_dependency {
            self.graph.remove_node(&id);
            self.failed.insert(id.clone());
            let result = ProcessingResult::failed(
                id.clone(),
                None,
                node.priority.pool_kind(),
                Duration::ZERO,
                ProcessingError::DependencyFailed { dependency },
            );
            self.deferred.push(result);
            return Ok(id);
        }

        node.state = NodeState::Pending;
        let ready = self.graph.in_degree(&id) == Some(0);
        let priority = node.priority;
        self.active.insert(
            id.clone(),
            ActiveNode {
                node,
                cancellation: CancellationToken::new(),
            },
        );
        if ready {
            self.queue.push(PrioritizedTask::new(id.clone(), priority));
        }

        Ok(id)
    }

    /// Run one batch of at most `max_size` ready nodes under the configured
    /// default deadline.
    pub async fn process_batch(&mut self, max_size: usize) -> Vec<ProcessingResult> {
        let deadline = self.config.batch_deadline();
        self.process_batch_with_deadline(max_size, deadline).await
    }

    /// Run one batch of at most `max_size` ready nodes.
    ///
    /// Nodes are popped in priority order, dispatched to the pool their
    /// priority class selects, and awaited together. Results come back in
    /// dispatch order, followed by any dependents failed through a cascade.
    /// Units still running when `deadline` elapses fail with
    /// [`ProcessingError::DeadlineExceeded`].
    pub async fn process_batch_with_deadline(
        &mut self,
        max_size: usize,
        deadline: Option<Duration>,
    ) -> Vec<ProcessingResult> {
        let started = Instant::now();
        let mut results = std::mem::take(&mut self.deferred);
        let mut unlocked = self.drain_in_flight(&mut results).await;

        let deadline = deadline.map(|budget| (tokio::time::Instant::now() + budget, budget));
        let (mut io_units, mut cpu_units) = (0, 0);

        while io_units + cpu_units < max_size {
            let active = &self.active;
            let Some(id) = self.queue.pop_next_active(|id| {
                active
                    .get(id)
                    .is_some_and(|a| a.node.state == NodeState::Pending)
            }) else {
                break;
            };
            let Some(entry) = self.active.get_mut(&id) else {
                continue;
            };

            entry.node.state = NodeState::Processing;
            let node = Arc::new(entry.node.clone());
            let cancellation = entry.cancellation.clone();
            let pool = node.priority.pool_kind();
            let unit = DispatchUnit {
                processor: self.registry.resolve(&node.source_type),
                node,
                pool,
                cancellation,
                deadline,
            };

            let handle = match pool {
                PoolKind::Io => {
                    io_units += 1;
                    self.io_pool.spawn(unit)
                }
                PoolKind::Cpu => {
                    cpu_units += 1;
                    self.cpu_pool.spawn(unit)
                }
            };
            self.in_flight.push_back(InFlight {
                node_id: id,
                pool,
                handle,
            });
        }

        BatchDispatched {
            requested: max_size,
            dispatched: io_units + cpu_units,
            io_units,
            cpu_units,
            io_pool_size: self.io_pool.size(),
            cpu_pool_size: self.cpu_pool.size(),
            queue_remaining: self.queue.len(),
        }
        .log();

        unlocked += self.drain_in_flight(&mut results).await;

        let succeeded = results.iter().filter(|r| r.success).count();
        BatchCompleted {
            succeeded,
            failed: results.len() - succeeded,
            unlocked,
            duration: started.elapsed(),
        }
        .log();

        results
    }

    /// Cancel a node the engine still owns.
    ///
    /// A Pending node leaves the queue and graph immediately. A Processing
    /// node has its token fired; its result comes back from the batch that
    /// dispatched it. Returns `false` for unknown or terminal nodes.
    pub fn cancel(&mut self, node_id: &str) -> bool {
        let Some(entry) = self.active.get(node_id) else {
            return false;
        };

        let state = entry.node.state;
        match state {
            NodeState::Processing => {
                entry.cancellation.cancel();
                tracing::info!(
                    "{}",
                    NodeCancelled {
                        node_id,
                        was_running: true
                    }
                );
                true
            }
            _ => {
                if let Some(entry) = self.active.remove(node_id) {
                    entry.cancellation.cancel();
                }
                self.queue.remove(node_id);
                self.cancelled.insert(node_id.to_string());
                tracing::info!(
                    "{}",
                    NodeCancelled {
                        node_id,
                        was_running: false
                    }
                );

                let mut cascaded = Vec::new();
                self.settle_unfinished(node_id, &mut cascaded);
                self.deferred.extend(cascaded);
                true
            }
        }
    }

    /// Current state of a node, if the engine has seen it.
    pub fn state(&self, node_id: &str) -> Option<NodeState> {
        if let Some(entry) = self.active.get(node_id) {
            return Some(entry.node.state);
        }
        if self.completed.contains(node_id) {
            Some(NodeState::Completed)
        } else if self.cached.contains(node_id) {
            Some(NodeState::Cached)
        } else if self.failed.contains(node_id) {
            Some(NodeState::Failed)
        } else if self.cancelled.contains(node_id) {
            Some(NodeState::Cancelled)
        } else {
            None
        }
    }

    /// Output for `node_id`. Marks the entry most recently used.
    ///
    /// A Cached node is answered by whichever entry holds the content it was
    /// served from, so the result is `None` once that content is evicted.
    pub fn cached_output(&mut self, node_id: &str) -> Option<CachedOutput> {
        match self.served_from.get(node_id) {
            Some(hash) => self
                .cache
                .get_by_content(hash)
                .map(|(_, output)| output.clone()),
            None => self.cache.get(node_id).cloned(),
        }
    }

    /// Nothing queued and nothing in flight.
    ///
    /// Nodes blocked on dependencies that never complete do not keep the
    /// engine busy.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty() && self.deferred.is_empty()
    }

    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.snapshot(Gauges {
            active_count: self.active.len(),
            queue_size: self.queue.len(),
            cache_size: self.cache.len(),
            completed_count: self.completed.len(),
            failed_count: self.failed.len(),
            cancelled_count: self.cancelled.len(),
        })
    }

    /// Wait for every in-flight unit, apply its result, and close both pools.
    pub async fn shutdown(mut self) -> EngineMetrics {
        let started = Instant::now();
        let drained_units = self.in_flight.len();

        let mut results = Vec::new();
        self.drain_in_flight(&mut results).await;
        self.io_pool.shutdown().await;
        self.cpu_pool.shutdown().await;

        let metrics = self.metrics();
        EngineShutdown {
            drained_units,
            total_processed: metrics.total_processed,
            duration: started.elapsed(),
        }
        .log();
        metrics
    }

    /// Await in-flight units in dispatch order, applying each result.
    ///
    /// A handle is only popped once it has resolved, so dropping the future
    /// mid-wait leaves the remaining units for the next call.
    async fn drain_in_flight(&mut self, results: &mut Vec<ProcessingResult>) -> usize {
        let mut unlocked = 0;

        while let Some(front) = self.in_flight.front_mut() {
            let joined = (&mut front.handle).await;
            let Some(in_flight) = self.in_flight.pop_front() else {
                break;
            };

            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    ProcessingResult::failed(
                        in_flight.node_id,
                        None,
                        in_flight.pool,
                        Duration::ZERO,
                        ProcessingError::WorkerPanicked(e.to_string()),
                    )
                    .into()
                }
            };
            unlocked += self.apply_outcome(outcome, results);
        }

        unlocked
    }

    /// Apply one unit's outcome to engine state. Returns how many dependents
    /// became ready.
    fn apply_outcome(&mut self, outcome: UnitOutcome, results: &mut Vec<ProcessingResult>) -> usize {
        let UnitOutcome { result, output } = outcome;
        let id = result.node_id.clone();

        let Some(entry) = self.active.remove(&id) else {
            results.push(result);
            return 0;
        };

        if !result.success {
            if result.was_cancelled() {
                self.cancelled.insert(id.clone());
            } else {
                self.metrics.record_failure();
                self.failed.insert(id.clone());
            }
            results.push(result);
            self.settle_unfinished(&id, results);
            return 0;
        }

        if let (Some(value), Some(output_hash)) = (output, result.output_hash.clone()) {
            let cached = CachedOutput {
                value,
                output_hash,
                processor: result.processor.clone().unwrap_or_default(),
            };
            match self.cache.put(id.clone(), cached, entry.node.content_hash.clone()) {
                PutOutcome::Inserted {
                    evicted: Some(evicted),
                } => CacheEvicted {
                    key: &evicted.key,
                    content_hash: evicted.hash.as_str(),
                    capacity: self.cache.capacity(),
                }
                .log(),
                PutOutcome::Deduplicated { existing } => CacheWriteDeduplicated {
                    key: &id,
                    existing: &existing,
                }
                .log(),
                _ => {}
            }
        }

        self.metrics.record_success(result.elapsed);
        self.completed.insert(id.clone());
        results.push(result);

        let ready = self.graph.mark_completed(&id);
        let unlocked = ready.len();
        self.enqueue_ready(ready);
        unlocked
    }

    /// Drop a node that will never complete from the graph.
    ///
    /// Under [`FailurePropagation::Isolate`] its dependents keep their edge
    /// and stay blocked. Under [`FailurePropagation::Cascade`] every transitive
    /// dependent is failed with [`ProcessingError::DependencyFailed`].
    fn settle_unfinished(&mut self, node_id: &str, results: &mut Vec<ProcessingResult>) {
        if self.config.failure_propagation == FailurePropagation::Isolate {
            self.graph.remove_node(node_id);
            return;
        }

        let dependents = self.graph.transitive_dependents(node_id);
        self.graph.remove_node(node_id);
        if dependents.is_empty() {
            return;
        }

        FailureCascaded {
            node_id,
            dependents: &dependents,
        }
        .log();

        for dependent in dependents {
            self.graph.remove_node(&dependent);
            let Some(entry) = self.active.remove(&dependent) else {
                continue;
            };
            entry.cancellation.cancel();
            self.queue.remove(&dependent);
            self.failed.insert(dependent.clone());
            results.push(ProcessingResult::failed(
                dependent,
                None,
                entry.node.priority.pool_kind(),
                Duration::ZERO,
                ProcessingError::DependencyFailed {
                    dependency: node_id.to_string(),
                },
            ));
        }
    }

    fn enqueue_ready(&mut self, ready: Vec<NodeId>) {
        for id in ready {
            if let Some(entry) = self.active.get(&id) {
                if entry.node.state == NodeState::Pending {
                    self.queue.push(PrioritizedTask::new(id, entry.node.priority));
                }
            }
        }
    }

    // A resubmitted id starts a fresh lifecycle.
    fn forget_terminal(&mut self, node_id: &str) {
        self.completed.remove(node_id);
        self.failed.remove(node_id);
        self.cached.remove(node_id);
        self.served_from.remove(node_id);
        self.cancelled.remove(node_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::node::{ContentHash, Priority};

    fn engine() -> UnifiedEngine {
        UnifiedEngine::new(EngineConfig::default())
    }

    #[test]
    fn test_submit_without_dependencies_is_queued() {
        let mut engine = engine();
        let id = engine
            .submit(DataNode::new("a", "feed", Priority::Low))
            .unwrap();

        assert_eq!(id, "a");
        assert_eq!(engine.state("a"), Some(NodeState::Pending));
        assert_eq!(engine.metrics().queue_size, 1);
        assert_eq!(engine.metrics().cache_misses, 1);
    }

    #[test]
    fn test_submit_with_dependency_waits() {
        let mut engine = engine();
        engine
            .submit(DataNode::new("b", "feed", Priority::High).with_dependency("a"))
            .unwrap();

        assert_eq!(engine.state("b"), Some(NodeState::Pending));
        assert_eq!(engine.metrics().queue_size, 0);
        assert_eq!(engine.graph.in_degree("b"), Some(1));
    }

    #[test]
    fn test_duplicate_active_node_is_rejected() {
        let mut engine = engine();
        engine
            .submit(DataNode::new("a", "feed", Priority::Low))
            .unwrap();

        let err = engine
            .submit(DataNode::new("a", "feed", Priority::High))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicateNode {
                node_id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut engine = engine();
        engine
            .submit(DataNode::new("a", "feed", Priority::Low).with_dependency("b"))
            .unwrap();

        let err = engine
            .submit(DataNode::new("b", "feed", Priority::Low).with_dependency("a"))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::CyclicDependency {
                cycle: vec!["b".to_string(), "a".to_string(), "b".to_string()]
            }
        );
        assert_eq!(engine.state("b"), None);
    }

    #[test]
    fn test_cycle_accepted_when_detection_disabled() {
        let mut engine = UnifiedEngine::new(EngineConfig {
            reject_cycles: false,
            ..EngineConfig::default()
        });
        engine
            .submit(DataNode::new("a", "feed", Priority::Low).with_dependency("b"))
            .unwrap();
        engine
            .submit(DataNode::new("b", "feed", Priority::Low).with_dependency("a"))
            .unwrap();

        assert_eq!(engine.metrics().queue_size, 0);
        assert_eq!(engine.metrics().active_count, 2);
    }

    #[test]
    fn test_cached_content_short_circuits_and_unblocks() {
        let mut engine = engine();
        let hash = ContentHash::digest(b"payload");
        engine.cache.put(
            "earlier".to_string(),
            CachedOutput {
                value: serde_json::json!(1),
                output_hash: ContentHash::digest(b"1"),
                processor: "p".to_string(),
            },
            hash.clone(),
        );
        engine
            .submit(DataNode::new("child", "feed", Priority::Low).with_dependency("dup"))
            .unwrap();

        engine
            .submit(DataNode::new("dup", "feed", Priority::Low).with_content_hash(hash))
            .unwrap();

        assert_eq!(engine.state("dup"), Some(NodeState::Cached));
        assert_eq!(engine.metrics().cache_hits, 1);
        assert_eq!(engine.queue.peek().map(|t| t.node_id.as_str()), Some("child"));
    }

    #[test]
    fn test_cancel_pending_node() {
        let mut engine = engine();
        engine
            .submit(DataNode::new("a", "feed", Priority::Low))
            .unwrap();

        assert!(engine.cancel("a"));
        assert_eq!(engine.state("a"), Some(NodeState::Cancelled));
        assert_eq!(engine.metrics().queue_size, 0);
        assert_eq!(engine.metrics().cancelled_count, 1);
        assert!(!engine.cancel("a"));
        assert!(!engine.cancel("never-submitted"));
    }

    #[test]
    fn test_cascade_on_cancel_is_reported_on_next_batch() {
        let mut engine = UnifiedEngine::new(EngineConfig {
            failure_propagation: FailurePropagation::Cascade,
            ..EngineConfig::default()
        });
        engine
            .submit(DataNode::new("a", "feed", Priority::Low))
            .unwrap();
        engine
            .submit(DataNode::new("b", "feed", Priority::Low).with_dependency("a"))
            .unwrap();

        engine.cancel("a");

        assert_eq!(engine.state("b"), Some(NodeState::Failed));
        assert_eq!(engine.deferred.len(), 1);
        assert!(!engine.is_idle());
    }
}
