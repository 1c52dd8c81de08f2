// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Incremental dependency graph with in-degree counting.
//!
//! The graph tracks, for every submitted node, the set of dependencies that
//! have not completed yet, the reverse edges (who is waiting on whom), and an
//! in-degree counter equal to the size of the unresolved set. A node whose
//! in-degree is zero is ready.
//!
//! # Complexity
//!
//! - `add_dependency` / `remove_dependency`: O(1)
//! - `mark_completed`: O(k) where k is the number of dependents
//! - `ready_nodes`: O(n) over tracked nodes
//! - `find_cycle`: O(V + E), only used at submission time
//!
//! The graph does not reject cycles on its own. A cyclic dependency set never
//! reaches in-degree zero; callers that care run [`DependencyGraph::find_cycle`]
//! before adding edges.
//!
//! # Examples
//!
//! ```rust
//! use unified_engine::engine::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("load");
//! graph.add_node("transform");
//! graph.add_dependency("transform", "load");
//!
//! assert_eq!(graph.ready_nodes(), vec!["load".to_string()]);
//! assert_eq!(graph.mark_completed("load"), vec!["transform".to_string()]);
//! ```

use std::collections::{HashMap, HashSet};

use crate::engine::node::NodeId;

#[derive(Debug, Default)]
pub struct DependencyGraph {
    // node -> dependencies not yet completed
    dependencies: HashMap<NodeId, HashSet<NodeId>>,
    // dependency -> nodes waiting on it
    dependents: HashMap<NodeId, HashSet<NodeId>>,
    in_degree: HashMap<NodeId, usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `node` with no dependencies.
    pub fn add_node(&mut self, node: impl Into<NodeId>) {
        let node = node.into();
        self.dependencies.entry(node.clone()).or_default();
        self.in_degree.entry(node).or_insert(0);
    }

    pub fn contains(&self, node: &str) -> bool {
        self.in_degree.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.in_degree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_degree.is_empty()
    }

    /// Register `dep` as required before `node`.
    ///
    /// Adding the same edge twice leaves the in-degree unchanged. `dep` does not
    /// need to be tracked yet; forward references simply wait until it is
    /// submitted and completes.
    pub fn add_dependency(&mut self, node: impl Into<NodeId>, dep: impl Into<NodeId>) {
        let node = node.into();
        let dep = dep.into();

        let inserted = self
            .dependencies
            .entry(node.clone())
            .or_default()
            .insert(dep.clone());
        if !inserted {
            return;
        }

        self.dependents.entry(dep).or_default().insert(node.clone());
        *self.in_degree.entry(node).or_insert(0) += 1;
    }

    /// Inverse of [`add_dependency`](Self::add_dependency).
    ///
    /// Returns `true` if removing the edge made `node` ready.
    pub fn remove_dependency(&mut self, node: &str, dep: &str) -> bool {
        let removed = self
            .dependencies
            .get_mut(node)
            .map(|deps| deps.remove(dep))
            .unwrap_or(false);
        if !removed {
            return false;
        }

        if let Some(waiting) = self.dependents.get_mut(dep) {
            waiting.remove(node);
            if waiting.is_empty() {
                self.dependents.remove(dep);
            }
        }

        match self.in_degree.get_mut(node) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count == 0
            }
            None => false,
        }
    }

    /// All tracked nodes with in-degree zero.
    pub fn ready_nodes(&self) -> Vec<NodeId> {
        self.in_degree
            .iter()
            .filter_map(|(id, &count)| if count == 0 { Some(id.clone()) } else { None })
            .collect()
    }

    pub fn in_degree(&self, node: &str) -> Option<usize> {
        self.in_degree.get(node).copied()
    }

    /// Resolve `node` for everything waiting on it.
    ///
    /// Each dependent's in-degree drops by one; those reaching zero are
    /// returned. `node` itself stops being tracked.
    pub fn mark_completed(&mut self, node: &str) -> Vec<NodeId> {
        let mut newly_ready = Vec::new();

        if let Some(waiting) = self.dependents.remove(node) {
            for dependent in waiting {
                let resolved = self
                    .dependencies
                    .get_mut(&dependent)
                    .map(|deps| deps.remove(node))
                    .unwrap_or(false);
                if !resolved {
                    continue;
                }
                if let Some(count) = self.in_degree.get_mut(&dependent) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        newly_ready.push(dependent);
                    }
                }
            }
        }

        self.forget(node);
        newly_ready
    }

    /// Stop tracking `node` without resolving its dependents.
    ///
    /// Used for cancelled or failed nodes: anything waiting on `node` keeps its
    /// edge and stays blocked.
    pub fn remove_node(&mut self, node: &str) {
        self.forget(node);
    }

    fn forget(&mut self, node: &str) {
        if let Some(deps) = self.dependencies.remove(node) {
            for dep in deps {
                if let Some(waiting) = self.dependents.get_mut(&dep) {
                    waiting.remove(node);
                    if waiting.is_empty() {
                        self.dependents.remove(&dep);
                    }
                }
            }
        }
        self.in_degree.remove(node);
    }

    /// Every node that transitively waits on `node`, in breadth-first order.
    pub fn transitive_dependents(&self, node: &str) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut frontier: Vec<&NodeId> = self
            .dependents
            .get(node)
            .map(|w| w.iter().collect())
            .unwrap_or_default();

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in frontier {
                if seen.insert(id.clone()) {
                    order.push(id.clone());
                    if let Some(waiting) = self.dependents.get(id) {
                        next.extend(waiting.iter());
                    }
                }
            }
            frontier = next;
        }

        order
    }

    /// Check whether giving `node` the dependencies `deps` would close a cycle.
    ///
    /// Walks the unresolved-dependency edges from each of `deps` with an
    /// explicit DFS stack; if `node` is reachable the cycle path is returned as
    /// `node -> ... -> node`.
    pub fn find_cycle<'a, I>(&self, node: &str, deps: I) -> Option<Vec<NodeId>>
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        let mut visited: HashSet<&str> = HashSet::new();

        for dep in deps {
            if dep == node {
                return Some(vec![node.to_string(), node.to_string()]);
            }

            // (current node, path taken to reach it)
            let mut stack: Vec<(&str, Vec<&str>)> = vec![(dep.as_str(), vec![dep.as_str()])];
            while let Some((current, path)) = stack.pop() {
                if !visited.insert(current) {
                    continue;
                }
                let Some(next_deps) = self.dependencies.get(current) else {
                    continue;
                };
                for next in next_deps {
                    if next == node {
                        let mut cycle = vec![node.to_string()];
                        cycle.extend(path.iter().map(|s| s.to_string()));
                        cycle.push(node.to_string());
                        return Some(cycle);
                    }
                    let mut next_path = path.clone();
                    next_path.push(next.as_str());
                    stack.push((next.as_str(), next_path));
                }
            }
        }

        None
    }
}
