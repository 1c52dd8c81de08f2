// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the engine at submission time and by dispatched units.

use std::time::Duration;
use thiserror::Error;

/// Rejections returned synchronously from [`UnifiedEngine::submit`](crate::engine::UnifiedEngine::submit).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A node with this id is still pending or processing
    #[error("Node '{node_id}' is already active")]
    DuplicateNode { node_id: String },

    /// Adding the node's dependencies would close a cycle
    #[error("Cyclic dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// The cycle path, starting and ending at the submitted node
        cycle: Vec<String>,
    },
}

/// Per-node failure carried in [`ProcessingResult::error`](crate::engine::ProcessingResult).
///
/// These never abort a batch; each one is attached to the result of the node it
/// belongs to.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    /// No exact or compatible processor is registered for the source type
    #[error("No processor registered for source type '{source_type}'")]
    ProcessorNotFound { source_type: String },

    /// The processor returned an error
    #[error("Processor '{processor}' failed: {message}")]
    ExecutionFailed { processor: String, message: String },

    /// The node's cancellation token fired before the processor finished
    #[error("Node was cancelled")]
    Cancelled,

    /// The batch deadline elapsed before the processor finished
    #[error("Batch deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The worker running the processor panicked
    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    /// The pool was closed before the unit could start
    #[error("Worker pool '{0}' is shut down")]
    PoolClosed(&'static str),

    /// A dependency failed and failure propagation is set to cascade
    #[error("Dependency '{dependency}' did not complete")]
    DependencyFailed { dependency: String },
}
