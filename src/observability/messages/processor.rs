// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for processor registration, resolution and execution.
//!
//! This module contains message types for logging events related to:
//! * Processor registration in the registry
//! * Resolution through compatibility metadata
//! * Processor execution lifecycle (completion, failure)

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Processor registered for a source type.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use unified_engine::observability::messages::processor::ProcessorRegistered;
///
/// let compatible = vec!["instagram".to_string()];
/// let msg = ProcessorRegistered {
///     source_type: "social",
///     processor: "echo",
///     compatible_sources: &compatible,
///     replaced: false,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ProcessorRegistered<'a> {
    pub source_type: &'a str,
    pub processor: &'a str,
    pub compatible_sources: &'a [String],
    pub replaced: bool,
}

impl Display for ProcessorRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let verb = if self.replaced { "replaced" } else { "registered" };
        write!(
            f,
            "Processor '{}' {} for source type '{}' (compatible: [{}])",
            self.processor,
            verb,
            self.source_type,
            self.compatible_sources.join(", ")
        )
    }
}

/// No exact processor; a compatible one was used instead.
///
/// # Log Level
/// `debug!` - Diagnostic information
pub struct ProcessorResolvedByCompatibility<'a> {
    pub source_type: &'a str,
    pub resolved_to: &'a str,
}

impl Display for ProcessorResolvedByCompatibility<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No exact processor for '{}'; using compatible processor registered as '{}'",
            self.source_type, self.resolved_to
        )
    }
}

/// Processor execution completed successfully.
///
/// # Log Level
/// `debug!` - High-volume execution event
///
/// # Example
/// ```
/// use unified_engine::observability::messages::processor::ProcessorExecutionCompleted;
/// use std::time::Duration;
///
/// let msg = ProcessorExecutionCompleted {
///     node_id: "row-9",
///     processor: "echo",
///     pool: "cpu",
///     output_size: 128,
///     duration: Duration::from_millis(10),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ProcessorExecutionCompleted<'a> {
    pub node_id: &'a str,
    pub processor: &'a str,
    pub pool: &'a str,
    pub output_size: usize,
    pub duration: std::time::Duration,
}

impl Display for ProcessorExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' completed node '{}' on {} pool: output={} bytes, duration={:?}",
            self.processor, self.node_id, self.pool, self.output_size, self.duration
        )
    }
}

/// Processor execution failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use unified_engine::observability::messages::processor::ProcessorExecutionFailed;
/// use unified_engine::errors::ProcessingError;
///
/// let error = ProcessingError::Cancelled;
/// let msg = ProcessorExecutionFailed {
///     node_id: "row-9",
///     processor: Some("echo"),
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ProcessorExecutionFailed<'a> {
    pub node_id: &'a str,
    pub processor: Option<&'a str>,
    pub error: &'a dyn std::error::Error,
}

impl Display for ProcessorExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' failed in processor '{}': {}",
            self.node_id,
            self.processor.unwrap_or("<unresolved>"),
            self.error
        )
    }
}

impl StructuredLog for ProcessorExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_id = self.node_id,
            processor = self.processor.unwrap_or("<unresolved>"),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "processor_failed",
            span_name = name,
            node_id = self.node_id,
        )
    }
}
