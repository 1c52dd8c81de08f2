// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::DataNode;

/// A handler for one data source type.
///
/// Processors are black boxes to the engine: they receive an immutable
/// snapshot of a node and return an output value or an error. They never
/// touch engine state.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, node: &DataNode) -> anyhow::Result<serde_json::Value>;

    fn name(&self) -> &str;
}

/// Adapts a plain closure into a [`Processor`].
///
/// # Examples
///
/// ```rust
/// use unified_engine::traits::{FnProcessor, Processor};
/// use unified_engine::engine::{DataNode, Priority};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let upper = FnProcessor::new("upper_source", |node: &DataNode| {
///     Ok(serde_json::json!(node.source_type.to_uppercase()))
/// });
///
/// let out = upper.process(&DataNode::new("n1", "rss", Priority::Low)).await?;
/// assert_eq!(out, serde_json::json!("RSS"));
/// # Ok(())
/// # }
/// ```
pub struct FnProcessor<F> {
    name: String,
    func: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(&DataNode) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Processor for FnProcessor<F>
where
    F: Fn(&DataNode) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    async fn process(&self, node: &DataNode) -> anyhow::Result<serde_json::Value> {
        (self.func)(node)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
