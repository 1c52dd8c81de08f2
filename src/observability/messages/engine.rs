// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for engine lifecycle and scheduling events.
//!
//! This module contains message types for logging events related to:
//! * Node submission (accepted, short-circuited by cache, rejected)
//! * Batch dispatch and completion
//! * Failure cascades (unlock counts are reported with batch completion)
//! * Cancellation and shutdown

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Node accepted into the engine.
///
/// # Log Level
/// `debug!` - High-volume scheduling event
///
/// # Example
/// ```
/// use unified_engine::observability::messages::engine::NodeSubmitted;
///
/// let msg = NodeSubmitted {
///     node_id: "post-1",
///     source_type: "twitter",
///     priority: "high",
///     dependency_count: 2,
/// };
///
/// assert!(msg.to_string().contains("post-1"));
/// ```
pub struct NodeSubmitted<'a> {
    pub node_id: &'a str,
    pub source_type: &'a str,
    pub priority: &'a str,
    pub dependency_count: usize,
}

impl Display for NodeSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' submitted: source_type={}, priority={}, dependencies={}",
            self.node_id, self.source_type, self.priority, self.dependency_count
        )
    }
}

impl StructuredLog for NodeSubmitted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            source_type = self.source_type,
            priority = self.priority,
            dependency_count = self.dependency_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "submit",
            span_name = name,
            node_id = self.node_id,
            source_type = self.source_type,
            priority = self.priority,
        )
    }
}

/// Submission short-circuited because the content is already cached.
///
/// # Log Level
/// `debug!` - High-volume scheduling event
pub struct NodeServedFromCache<'a> {
    pub node_id: &'a str,
    pub content_hash: &'a str,
    pub cached_key: &'a str,
}

impl Display for NodeServedFromCache<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' served from cache: content {} already computed by '{}'",
            self.node_id, self.content_hash, self.cached_key
        )
    }
}

impl StructuredLog for NodeServedFromCache<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            content_hash = self.content_hash,
            cached_key = self.cached_key,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "cache_hit",
            span_name = name,
            node_id = self.node_id,
            content_hash = self.content_hash,
        )
    }
}

/// Submission rejected because its dependencies would close a cycle.
///
/// # Log Level
/// `warn!` - Caller error, engine keeps running
///
/// # Example
/// ```
/// use unified_engine::observability::messages::engine::CyclicSubmissionRejected;
///
/// let cycle = vec!["a".to_string(), "b".to_string(), "a".to_string()];
/// let msg = CyclicSubmissionRejected { node_id: "a", cycle: &cycle };
///
/// assert_eq!(msg.to_string(), "Rejected node 'a': cyclic dependency a -> b -> a");
/// ```
pub struct CyclicSubmissionRejected<'a> {
    pub node_id: &'a str,
    pub cycle: &'a [String],
}

impl Display for CyclicSubmissionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rejected node '{}': cyclic dependency {}",
            self.node_id,
            self.cycle.join(" -> ")
        )
    }
}

impl StructuredLog for CyclicSubmissionRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "cycle_rejected",
            span_name = name,
            node_id = self.node_id,
            cycle_length = self.cycle.len(),
        )
    }
}

/// A batch was popped from the queue and handed to the worker pools.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BatchDispatched {
    pub requested: usize,
    pub dispatched: usize,
    pub io_units: usize,
    pub cpu_units: usize,
    pub io_pool_size: usize,
    pub cpu_pool_size: usize,
    pub queue_remaining: usize,
}

impl Display for BatchDispatched {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatched batch: {}/{} nodes (io={}/{}, cpu={}/{}), {} still queued",
            self.dispatched,
            self.requested,
            self.io_units,
            self.io_pool_size,
            self.cpu_units,
            self.cpu_pool_size,
            self.queue_remaining
        )
    }
}

impl StructuredLog for BatchDispatched {
    fn log(&self) {
        tracing::info!(
            requested = self.requested,
            dispatched = self.dispatched,
            io_units = self.io_units,
            cpu_units = self.cpu_units,
            io_pool_size = self.io_pool_size,
            cpu_pool_size = self.cpu_pool_size,
            queue_remaining = self.queue_remaining,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch",
            span_name = name,
            requested = self.requested,
            dispatched = self.dispatched,
        )
    }
}

/// Every unit of a batch has returned and been applied.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BatchCompleted {
    pub succeeded: usize,
    pub failed: usize,
    pub unlocked: usize,
    pub duration: Duration,
}

impl Display for BatchCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch completed in {:?}: {} succeeded, {} failed, {} dependents unlocked",
            self.duration, self.succeeded, self.failed, self.unlocked
        )
    }
}

impl StructuredLog for BatchCompleted {
    fn log(&self) {
        tracing::info!(
            succeeded = self.succeeded,
            failed = self.failed,
            unlocked = self.unlocked,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch_completed",
            span_name = name,
            succeeded = self.succeeded,
            failed = self.failed,
            duration = ?self.duration,
        )
    }
}

/// A failed node's dependents were failed with it.
///
/// # Log Level
/// `warn!` - Work dropped because of an upstream failure
pub struct FailureCascaded<'a> {
    pub node_id: &'a str,
    pub dependents: &'a [String],
}

impl Display for FailureCascaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' did not complete; failing {} dependents: [{}]",
            self.node_id,
            self.dependents.len(),
            self.dependents.join(", ")
        )
    }
}

impl StructuredLog for FailureCascaded<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            dependent_count = self.dependents.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("cascade", span_name = name, node_id = self.node_id)
    }
}

/// A node was cancelled by the caller.
///
/// # Log Level
/// `info!` - Caller-initiated state change
pub struct NodeCancelled<'a> {
    pub node_id: &'a str,
    pub was_running: bool,
}

impl Display for NodeCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.was_running {
            write!(f, "Cancellation requested for running node '{}'", self.node_id)
        } else {
            write!(f, "Node '{}' cancelled before dispatch", self.node_id)
        }
    }
}

/// Engine shutdown drained the worker pools.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EngineShutdown {
    pub drained_units: usize,
    pub total_processed: u64,
    pub duration: Duration,
}

impl Display for EngineShutdown {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine shut down in {:?}: drained {} in-flight units, {} nodes processed in total",
            self.duration, self.drained_units, self.total_processed
        )
    }
}

impl StructuredLog for EngineShutdown {
    fn log(&self) {
        tracing::info!(
            drained_units = self.drained_units,
            total_processed = self.total_processed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("shutdown", span_name = name)
    }
}
