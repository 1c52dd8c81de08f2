// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded worker pools that execute dispatched nodes off the coordinator.
//!
//! Two pools exist, selected by the node's priority class:
//!
//! - **I/O pool** (Critical/High): units run as ordinary tokio tasks, sized for
//!   many interleaved, latency-sensitive executions.
//! - **CPU pool** (Medium/Low): units run on tokio's blocking thread pool via
//!   `spawn_blocking`, sized near the host core count, so heavy processors never
//!   occupy the async worker threads the I/O pool depends on.
//!
//! Each pool bounds concurrency with a [`Semaphore`] and registers every unit
//! with a [`TaskTracker`], which is what lets shutdown wait for in-flight work.
//!
//! A unit only ever sees an `Arc<DataNode>` snapshot and returns a
//! [`UnitOutcome`]; all engine state is updated by the coordinator afterwards.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::engine::node::{ContentHash, DataNode};
use crate::engine::result::ProcessingResult;
use crate::errors::ProcessingError;
use crate::observability::messages::processor::{
    ProcessorExecutionCompleted, ProcessorExecutionFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Processor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Io,
    Cpu,
}

impl PoolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PoolKind::Io => "io",
            PoolKind::Cpu => "cpu",
        }
    }
}

/// Everything a worker needs to execute one node.
pub struct DispatchUnit {
    pub node: Arc<DataNode>,
    /// Resolved processor and the name it ran under; `None` if resolution failed
    pub processor: Option<Arc<dyn Processor>>,
    pub pool: PoolKind,
    pub cancellation: CancellationToken,
    /// Absolute deadline plus the budget it was derived from (for error reporting)
    pub deadline: Option<(tokio::time::Instant, Duration)>,
}

/// What a unit hands back to the coordinator.
#[derive(Debug)]
pub struct UnitOutcome {
    pub result: ProcessingResult,
    pub output: Option<serde_json::Value>,
}

impl From<ProcessingResult> for UnitOutcome {
    fn from(result: ProcessingResult) -> Self {
        Self {
            result,
            output: None,
        }
    }
}

impl DispatchUnit {
    fn processor_name(&self) -> Option<String> {
        self.processor.as_ref().map(|p| p.name().to_string())
    }

    fn reject(self, error: ProcessingError) -> UnitOutcome {
        let processor = self.processor_name();
        ProcessingResult::failed(self.node.id.clone(), processor, self.pool, Duration::ZERO, error)
            .into()
    }

    /// Run the processor under the node's cancellation token and the batch deadline.
    pub async fn run(self) -> UnitOutcome {
        let started = Instant::now();
        let node_id = self.node.id.clone();

        let Some(processor) = self.processor.clone() else {
            let error = ProcessingError::ProcessorNotFound {
                source_type: self.node.source_type.clone(),
            };
            ProcessorExecutionFailed {
                node_id: &node_id,
                processor: None,
                error: &error,
            }
            .log();
            return ProcessingResult::failed(node_id, None, self.pool, started.elapsed(), error)
                .into();
        };
        let name = processor.name().to_string();

        let execution = async {
            let work = processor.process(&self.node);
            let outcome = match self.deadline {
                Some((at, budget)) => match tokio::time::timeout_at(at, work).await {
                    Ok(outcome) => outcome,
                    Err(_) => return Err(ProcessingError::DeadlineExceeded(budget)),
                },
                None => work.await,
            };
            outcome.map_err(|e| ProcessingError::ExecutionFailed {
                processor: name.clone(),
                message: format!("{e:#}"),
            })
        };

        let outcome = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(ProcessingError::Cancelled),
            outcome = execution => outcome,
        };

        let elapsed = started.elapsed();
        let value = match outcome {
            Ok(value) => value,
            Err(error) => {
                ProcessorExecutionFailed {
                    node_id: &node_id,
                    processor: Some(&name),
                    error: &error,
                }
                .log();
                return ProcessingResult::failed(node_id, Some(name), self.pool, elapsed, error)
                    .into();
            }
        };

        let bytes = match serde_json::to_vec(&value) {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = ProcessingError::ExecutionFailed {
                    processor: name.clone(),
                    message: format!("output is not serializable: {e}"),
                };
                return ProcessingResult::failed(node_id, Some(name), self.pool, elapsed, error)
                    .into();
            }
        };

        tracing::debug!(
            "{}",
            ProcessorExecutionCompleted {
                node_id: &node_id,
                processor: &name,
                pool: self.pool.as_str(),
                output_size: bytes.len(),
                duration: elapsed,
            }
        );

        let result = ProcessingResult::succeeded(
            node_id,
            name,
            self.pool,
            elapsed,
            ContentHash::digest(&bytes),
        )
        .with_metric("output_bytes", serde_json::json!(bytes.len()));

        UnitOutcome {
            result,
            output: Some(value),
        }
    }
}

/// A bounded execution pool.
#[derive(Debug)]
pub struct WorkerPool {
    kind: PoolKind,
    size: usize,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl WorkerPool {
    /// Create a pool allowing `size` concurrent units (minimum 1).
    pub fn new(kind: PoolKind, size: usize) -> Self {
        let size = size.max(1);
        Self {
            kind,
            size,
            permits: Arc::new(Semaphore::new(size)),
            tracker: TaskTracker::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Units spawned and not yet finished (running or waiting for a permit).
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Hand a unit to the pool. The returned handle resolves once the unit
    /// has obtained a permit and run to completion.
    pub fn spawn(&self, unit: DispatchUnit) -> JoinHandle<UnitOutcome> {
        let permits = Arc::clone(&self.permits);
        let kind = self.kind;

        if self.tracker.is_closed() {
            return self
                .tracker
                .spawn(async move { unit.reject(ProcessingError::PoolClosed(kind.as_str())) });
        }

        match kind {
            PoolKind::Io => self.tracker.spawn(async move {
                match permits.acquire_owned().await {
                    Ok(_permit) => unit.run().await,
                    Err(_) => unit.reject(ProcessingError::PoolClosed(kind.as_str())),
                }
            }),
            PoolKind::Cpu => self.tracker.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return unit.reject(ProcessingError::PoolClosed(kind.as_str())),
                };

                let node_id = unit.node.id.clone();
                let processor = unit.processor_name();
                let handle = Handle::current();
                match tokio::task::spawn_blocking(move || handle.block_on(unit.run())).await {
                    Ok(outcome) => outcome,
                    Err(e) => ProcessingResult::failed(
                        node_id,
                        processor,
                        kind,
                        Duration::ZERO,
                        ProcessingError::WorkerPanicked(e.to_string()),
                    )
                    .into(),
                }
            }),
        }
    }

    /// Stop accepting units and wait for every in-flight unit to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.permits.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{FailingProcessor, SlowProcessor, StubProcessor};
    use crate::engine::node::Priority;

    fn unit(processor: Option<Arc<dyn Processor>>, pool: PoolKind) -> DispatchUnit {
        DispatchUnit {
            node: Arc::new(DataNode::new("n1", "feed", Priority::Low)),
            processor,
            pool,
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_io_pool_runs_processor() {
        let pool = WorkerPool::new(PoolKind::Io, 2);
        let outcome = pool
            .spawn(unit(Some(Arc::new(StubProcessor::new("stub"))), PoolKind::Io))
            .await
            .unwrap();

        assert!(outcome.result.success);
        assert_eq!(outcome.result.pool, PoolKind::Io);
        assert_eq!(outcome.result.processor.as_deref(), Some("stub"));
        assert!(outcome.result.output_hash.is_some());
        assert!(outcome.output.is_some());
    }

    #[test]
    fn test_pool_size_is_at_least_one() {
        assert_eq!(WorkerPool::new(PoolKind::Cpu, 0).size(), 1);
        assert_eq!(WorkerPool::new(PoolKind::Io, 16).size(), 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cpu_pool_runs_on_blocking_thread() {
        let pool = WorkerPool::new(PoolKind::Cpu, 1);
        let outcome = pool
            .spawn(unit(Some(Arc::new(StubProcessor::new("stub"))), PoolKind::Cpu))
            .await
            .unwrap();

        assert!(outcome.result.success);
        assert_eq!(outcome.result.pool, PoolKind::Cpu);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_processor_fails_without_running() {
        let pool = WorkerPool::new(PoolKind::Io, 1);
        let outcome = pool.spawn(unit(None, PoolKind::Io)).await.unwrap();

        assert!(!outcome.result.success);
        assert_eq!(
            outcome.result.error,
            Some(ProcessingError::ProcessorNotFound {
                source_type: "feed".to_string()
            })
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_processor_error_is_captured() {
        let pool = WorkerPool::new(PoolKind::Cpu, 1);
        let outcome = pool
            .spawn(unit(Some(Arc::new(FailingProcessor::new("boom"))), PoolKind::Cpu))
            .await
            .unwrap();

        assert!(!outcome.result.success);
        assert!(matches!(
            outcome.result.error,
            Some(ProcessingError::ExecutionFailed { ref processor, .. }) if processor == "boom"
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_deadline_exceeded() {
        let pool = WorkerPool::new(PoolKind::Io, 1);
        let budget = Duration::from_millis(20);
        let mut u = unit(
            Some(Arc::new(SlowProcessor::new("slow", Duration::from_secs(5)))),
            PoolKind::Io,
        );
        u.deadline = Some((tokio::time::Instant::now() + budget, budget));

        let outcome = pool.spawn(u).await.unwrap();
        assert_eq!(
            outcome.result.error,
            Some(ProcessingError::DeadlineExceeded(budget))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancellation_interrupts_unit() {
        let pool = WorkerPool::new(PoolKind::Io, 1);
        let u = unit(
            Some(Arc::new(SlowProcessor::new("slow", Duration::from_secs(5)))),
            PoolKind::Io,
        );
        let token = u.cancellation.clone();

        let handle = pool.spawn(u);
        token.cancel();
        let outcome = handle.await.unwrap();

        assert!(outcome.result.was_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_waits_for_in_flight_units() {
        let pool = WorkerPool::new(PoolKind::Io, 4);
        let handles: Vec<_> = (0..3)
            .map(|_| {
                pool.spawn(unit(
                    Some(Arc::new(SlowProcessor::new("slow", Duration::from_millis(30)))),
                    PoolKind::Io,
                ))
            })
            .collect();

        pool.shutdown().await;
        assert_eq!(pool.in_flight(), 0);
        assert!(pool.is_closed());
        for handle in handles {
            assert!(handle.await.unwrap().result.success);
        }

        let late = pool
            .spawn(unit(Some(Arc::new(StubProcessor::new("stub"))), PoolKind::Io))
            .await
            .unwrap();
        assert_eq!(late.result.error, Some(ProcessingError::PoolClosed("io")));
    }
}
