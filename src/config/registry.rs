// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::backends::local::LocalProcessorFactory;
use crate::config::EngineConfig;
use crate::errors::ConfigError;
use crate::observability::messages::processor::{
    ProcessorRegistered, ProcessorResolvedByCompatibility,
};
use crate::traits::Processor;

/// Declares what a registered processor can consume besides its own source type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessorMetadata {
    pub compatible_sources: Vec<String>,
    pub description: Option<String>,
}

impl ProcessorMetadata {
    pub fn compatible_with<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            compatible_sources: sources.into_iter().map(Into::into).collect(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

struct Registration {
    processor: Arc<dyn Processor>,
    metadata: ProcessorMetadata,
}

/// Maps source types to processors.
///
/// Exact lookups are O(1). When no processor is registered for a source type
/// the registry falls back to the first processor, in registration order,
/// whose metadata lists that type as a compatible source.
#[derive(Default)]
pub struct ProcessorRegistry {
    entries: HashMap<String, Registration>,
    order: Vec<String>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `processor` for `source_type`. Returns `true` if it replaced
    /// an existing registration.
    pub fn register(
        &mut self,
        source_type: impl Into<String>,
        processor: Arc<dyn Processor>,
        metadata: ProcessorMetadata,
    ) -> bool {
        let source_type = source_type.into();
        tracing::info!(
            "{}",
            ProcessorRegistered {
                source_type: &source_type,
                processor: processor.name(),
                compatible_sources: &metadata.compatible_sources,
                replaced: self.entries.contains_key(&source_type),
            }
        );

        let previous = self.entries.insert(
            source_type.clone(),
            Registration {
                processor,
                metadata,
            },
        );
        if previous.is_none() {
            self.order.push(source_type);
        }
        previous.is_some()
    }

    /// Exact-match lookup.
    pub fn get_processor(&self, source_type: &str) -> Option<Arc<dyn Processor>> {
        self.entries
            .get(source_type)
            .map(|r| Arc::clone(&r.processor))
    }

    /// Source types whose processors declare `source_category` as compatible.
    pub fn get_compatible(&self, source_category: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|source_type| {
                self.entries.get(source_type.as_str()).is_some_and(|r| {
                    r.metadata
                        .compatible_sources
                        .iter()
                        .any(|s| s == source_category)
                })
            })
            .cloned()
            .collect()
    }

    /// Exact match, else the first compatible processor.
    pub fn resolve(&self, source_type: &str) -> Option<Arc<dyn Processor>> {
        if let Some(processor) = self.get_processor(source_type) {
            return Some(processor);
        }

        let fallback = self.get_compatible(source_type).into_iter().next()?;
        tracing::debug!(
            "{}",
            ProcessorResolvedByCompatibility {
                source_type,
                resolved_to: &fallback,
            }
        );
        self.get_processor(&fallback)
    }

    pub fn metadata(&self, source_type: &str) -> Option<&ProcessorMetadata> {
        self.entries.get(source_type).map(|r| &r.metadata)
    }

    /// Registered source types in registration order.
    pub fn source_types(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, source_type: &str) -> bool {
        self.entries.contains_key(source_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("source_types", &self.order)
            .finish()
    }
}

/// Resolves processors from config into a registry
pub fn build_registry(cfg: &EngineConfig) -> Result<ProcessorRegistry, ConfigError> {
    let mut registry = ProcessorRegistry::new();

    for p in &cfg.processors {
        let processor = LocalProcessorFactory::create_processor(p).map_err(|reason| {
            ConfigError::ProcessorCreationFailed {
                source_type: p.source_type.clone(),
                processor: p.processor.clone(),
                reason,
            }
        })?;

        registry.register(
            p.source_type.clone(),
            processor,
            ProcessorMetadata::compatible_with(p.compatible_sources.iter().cloned()),
        );
    }

    Ok(registry)
}
