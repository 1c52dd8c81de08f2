// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line. Types
//! that are logged on hot paths also implement [`StructuredLog`], which emits
//! the same data as structured `tracing` fields at the message's level.
//!
//! # Organization
//!
//! * `engine` - submission, batch dispatch, cascade and shutdown events
//! * `processor` - processor registration, resolution and execution events
//! * `cache` - eviction and deduplication events
//! * `validation` - configuration loading and validation events

use std::fmt::Display;
use tracing::Span;

pub mod cache;
pub mod engine;
pub mod processor;
pub mod validation;

/// Emit a message as a structured `tracing` event, or open a span carrying its fields.
pub trait StructuredLog: Display {
    /// Emit the event at the level documented on the message type.
    fn log(&self);

    /// Create a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
