// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::DataNode;
use crate::traits::Processor;

/// Returns the node id and source type as its output
pub struct StubProcessor {
    pub name: String,
}

impl StubProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait::async_trait]
impl Processor for StubProcessor {
    async fn process(&self, node: &DataNode) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::json!({ "id": node.id, "source_type": node.source_type }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A processor that always fails for testing failure scenarios
pub struct FailingProcessor {
    pub name: String,
}

impl FailingProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait::async_trait]
impl Processor for FailingProcessor {
    async fn process(&self, node: &DataNode) -> anyhow::Result<serde_json::Value> {
        anyhow::bail!("Simulated processor failure for '{}'", node.id)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sleeps before answering; used for cancellation and deadline tests
pub struct SlowProcessor {
    pub name: String,
    pub delay: Duration,
}

impl SlowProcessor {
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }
}

#[async_trait::async_trait]
impl Processor for SlowProcessor {
    async fn process(&self, node: &DataNode) -> anyhow::Result<serde_json::Value> {
        tokio::time::sleep(self.delay).await;
        Ok(serde_json::json!({ "id": node.id }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Counts invocations; output depends only on the node's content hash
pub struct CountingProcessor {
    pub name: String,
    pub calls: Arc<AtomicUsize>,
}

impl CountingProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Processor for CountingProcessor {
    async fn process(&self, node: &DataNode) -> anyhow::Result<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!({ "content": node.content_hash.as_str() }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Panics inside the worker
pub struct PanickingProcessor;

#[async_trait::async_trait]
impl Processor for PanickingProcessor {
    async fn process(&self, _node: &DataNode) -> anyhow::Result<serde_json::Value> {
        panic!("processor panicked")
    }

    fn name(&self) -> &str {
        "panicking"
    }
}
