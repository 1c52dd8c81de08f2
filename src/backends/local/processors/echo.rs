// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::DataNode;
use crate::traits::Processor;

/// Echo processor - returns the node's source type and metadata unchanged
///
/// The output is derived from content only (never the node id), so two nodes
/// carrying the same payload produce the same output hash.
pub struct EchoProcessor;

impl EchoProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for EchoProcessor {
    async fn process(&self, node: &DataNode) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::json!({
            "source_type": node.source_type,
            "metadata": node.metadata,
        }))
    }

    fn name(&self) -> &str {
        "echo"
    }
}
