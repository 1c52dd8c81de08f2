//! Priority-based ready queue for data node scheduling.
//!
//! This module provides the binary min-heap the engine pops ready nodes from.
//! Nodes land here only once every declared dependency has completed, so the
//! queue itself knows nothing about the graph: it orders by priority class and
//! lets the caller skip entries that stopped being active while queued.
//!
//! # Priority Ordering
//!
//! Tasks are ordered by **priority ordinal only**: Critical (0) before High (1)
//! before Medium (2) before Low (3).
//!
//! There is deliberately **no tie-break** among tasks of the same class. The
//! heap makes no FIFO promise and callers must not rely on insertion order
//! within a class.
//!
//! # Performance Characteristics
//!
//! - **push**: O(log n)
//! - **pop**: O(log n) per popped entry, plus O(log n) per stale entry skipped
//! - **Memory**: O(n)
//!
//! # Examples
//!
//! ## Basic usage with priority ordering
//! ```rust
//! use unified_engine::engine::Priority;
//! use unified_engine::engine::priority_work_queue::{PriorityWorkQueue, PrioritizedTask};
//!
//! let mut queue = PriorityWorkQueue::new();
//!
//! queue.push(PrioritizedTask::new("nightly_rollup".to_string(), Priority::Low));
//! queue.push(PrioritizedTask::new("fraud_check".to_string(), Priority::Critical));
//! queue.push(PrioritizedTask::new("feed_ingest".to_string(), Priority::Medium));
//!
//! let always_active = |_: &str| true;
//!
//! assert_eq!(queue.pop_next_active(always_active), Some("fraud_check".to_string()));
//! assert_eq!(queue.pop_next_active(always_active), Some("feed_ingest".to_string()));
//! assert_eq!(queue.pop_next_active(always_active), Some("nightly_rollup".to_string()));
//! ```
//!
//! ## Skipping entries that were cancelled while queued
//! ```rust
//! use std::collections::HashSet;
//! use unified_engine::engine::Priority;
//! use unified_engine::engine::priority_work_queue::{PriorityWorkQueue, PrioritizedTask};
//!
//! let mut queue = PriorityWorkQueue::new();
//! queue.push(PrioritizedTask::new("cancelled".to_string(), Priority::Critical));
//! queue.push(PrioritizedTask::new("still_wanted".to_string(), Priority::Low));
//!
//! let active: HashSet<&str> = ["still_wanted"].into_iter().collect();
//!
//! // The stale entry is discarded, not returned
//! assert_eq!(queue.pop_next_active(|id| active.contains(id)), Some("still_wanted".to_string()));
//! assert!(queue.is_empty());
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::engine::node::{NodeId, Priority};

/// A ready node waiting for dispatch.
///
/// Ordering compares the priority class only. Two tasks of the same class
/// compare `Equal` even if their ids differ, which is what leaves the pop
/// order among them unspecified.
#[derive(Debug, Clone)]
pub struct PrioritizedTask {
    pub node_id: NodeId,
    pub priority: Priority,
}

impl PrioritizedTask {
    pub fn new(node_id: NodeId, priority: Priority) -> Self {
        Self { node_id, priority }
    }
}

impl PartialEq for PrioritizedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for PrioritizedTask {}

impl PartialOrd for PrioritizedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrioritizedTask {
    /// BinaryHeap is a max-heap, so the comparison is reversed: the lowest
    /// ordinal compares greatest and is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.ordinal().cmp(&self.priority.ordinal())
    }
}

/// Binary min-heap of ready nodes keyed on priority ordinal.
#[derive(Debug, Default)]
pub struct PriorityWorkQueue {
    heap: BinaryHeap<PrioritizedTask>,
}

impl PriorityWorkQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, task: PrioritizedTask) {
        self.heap.push(task);
    }

    pub fn extend<I>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = PrioritizedTask>,
    {
        self.heap.extend(tasks);
    }

    /// Pop the highest-priority task whose node is still active.
    ///
    /// Entries for which `is_active` returns `false` (cancelled or otherwise
    /// resolved while queued) are dropped on the way.
    pub fn pop_next_active<F>(&mut self, is_active: F) -> Option<NodeId>
    where
        F: Fn(&str) -> bool,
    {
        while let Some(task) = self.heap.pop() {
            if is_active(&task.node_id) {
                return Some(task.node_id);
            }
            tracing::trace!(node_id = %task.node_id, "Discarding inactive queue entry");
        }
        None
    }

    /// Drop every entry for `node_id`. O(n); only used on cancellation.
    pub fn remove(&mut self, node_id: &str) -> bool {
        let before = self.heap.len();
        self.heap.retain(|task| task.node_id != node_id);
        self.heap.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn peek(&self) -> Option<&PrioritizedTask> {
        self.heap.peek()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrioritizedTask> {
        self.heap.iter()
    }
}
