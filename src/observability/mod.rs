// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout the engine. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep field names identical between the human-readable line and the structured event
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - submission, batch dispatch, unlock and shutdown events
//! * `messages::processor` - processor registration, resolution and execution events
//! * `messages::cache` - eviction and deduplication events
//! * `messages::validation` - configuration loading and validation events
//!
//! # Usage
//!
//! ```rust
//! use unified_engine::observability::messages::StructuredLog;
//! use unified_engine::observability::messages::engine::NodeSubmitted;
//!
//! let msg = NodeSubmitted {
//!     node_id: "post-1",
//!     source_type: "twitter",
//!     priority: "high",
//!     dependency_count: 0,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
