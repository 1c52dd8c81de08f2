// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Processor backend implementations for the unified engine.
//!
//! Each backend implements the `Processor` trait and can be instantiated
//! through configuration-driven factories.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process Rust processors usable for any source type:
//! - **echo**: returns the node's source type and metadata
//! - **select_fields**: projects a configured list of metadata keys
//!
//! ## Stub Backend (Test-Only)
//! Testing utilities for engine development (only available in test builds):
//! - **StubProcessor**: Returns the node id for scheduling tests
//! - **FailingProcessor**: Simulates failures for error handling tests
//! - **SlowProcessor**: Sleeps, for cancellation and deadline tests
//! - **CountingProcessor**: Counts invocations, for deduplication tests
//! - **PanickingProcessor**: Panics inside the worker
//!
//! # Examples
//!
//! ```rust
//! use unified_engine::backends::local::LocalProcessorFactory;
//! use unified_engine::config::ProcessorConfig;
//! use std::collections::HashMap;
//!
//! let config = ProcessorConfig {
//!     source_type: "payments".to_string(),
//!     processor: "echo".to_string(),
//!     compatible_sources: vec![],
//!     options: HashMap::new(),
//! };
//!
//! let processor = LocalProcessorFactory::create_processor(&config)?;
//! assert_eq!(processor.name(), "echo");
//! # Ok::<(), String>(())
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
