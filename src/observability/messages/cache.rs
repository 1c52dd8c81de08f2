// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for deduplicating cache events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Least recently used entry evicted to make room.
///
/// # Log Level
/// `debug!` - High-volume cache event
///
/// # Example
/// ```
/// use unified_engine::observability::messages::cache::CacheEvicted;
///
/// let msg = CacheEvicted { key: "row-1", content_hash: "ab12", capacity: 1000 };
/// assert!(msg.to_string().contains("row-1"));
/// ```
pub struct CacheEvicted<'a> {
    pub key: &'a str,
    pub content_hash: &'a str,
    pub capacity: usize,
}

impl Display for CacheEvicted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evicted '{}' (content {}) from cache at capacity {}",
            self.key, self.content_hash, self.capacity
        )
    }
}

impl StructuredLog for CacheEvicted<'_> {
    fn log(&self) {
        tracing::debug!(
            key = self.key,
            content_hash = self.content_hash,
            capacity = self.capacity,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("cache_evict", span_name = name, key = self.key)
    }
}

/// A write collapsed onto an entry with identical content.
///
/// # Log Level
/// `debug!` - High-volume cache event
pub struct CacheWriteDeduplicated<'a> {
    pub key: &'a str,
    pub existing: &'a str,
}

impl Display for CacheWriteDeduplicated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Output of '{}' matches cached content of '{}'; keeping a single entry",
            self.key, self.existing
        )
    }
}

impl StructuredLog for CacheWriteDeduplicated<'_> {
    fn log(&self) {
        tracing::debug!(key = self.key, existing = self.existing, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("cache_dedup", span_name = name, key = self.key)
    }
}
