// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::engine::node::{ContentHash, NodeId};
use crate::engine::worker_pool::PoolKind;
use crate::errors::ProcessingError;

/// Outcome of executing one node.
///
/// Produced by a worker unit and consumed once by the coordinator, which
/// applies it to the engine state and then hands it back to the caller of
/// `process_batch`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub node_id: NodeId,
    /// Name of the processor that ran, if one was resolved
    pub processor: Option<String>,
    pub pool: PoolKind,
    pub success: bool,
    pub elapsed: Duration,
    pub output_hash: Option<ContentHash>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ProcessingError>,
    pub metrics: HashMap<String, serde_json::Value>,
}

impl ProcessingResult {
    pub fn succeeded(
        node_id: NodeId,
        processor: String,
        pool: PoolKind,
        elapsed: Duration,
        output_hash: ContentHash,
    ) -> Self {
        Self {
            node_id,
            processor: Some(processor),
            pool,
            success: true,
            elapsed,
            output_hash: Some(output_hash),
            error: None,
            metrics: HashMap::new(),
        }
    }

    pub fn failed(
        node_id: NodeId,
        processor: Option<String>,
        pool: PoolKind,
        elapsed: Duration,
        error: ProcessingError,
    ) -> Self {
        Self {
            node_id,
            processor,
            pool,
            success: false,
            elapsed,
            output_hash: None,
            error: Some(error),
            metrics: HashMap::new(),
        }
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(self.error, Some(ProcessingError::Cancelled))
    }
}

fn serialize_error<S>(error: &Option<ProcessingError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Value stored in the engine cache for a completed node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedOutput {
    pub value: serde_json::Value,
    pub output_hash: ContentHash,
    pub processor: String,
}
