//! Configuration validation for engine settings and processor registrations.
//!
//! Validation runs every check and accumulates the failures, so a caller sees
//! all problems in one pass instead of fixing them one at a time.
//!
//! # Checks
//!
//! 1. **Capacity**: `cache_capacity` must be non-zero
//! 2. **Pools**: both `io_pool_size` and `cpu_pool_size` must be non-zero
//! 3. **Batches**: `batch_size` must be non-zero
//! 4. **Uniqueness**: each `source_type` is registered at most once
//! 5. **Implementations**: each `processor` names a known local implementation
//!
//! # Example
//! ```rust
//! use unified_engine::config::{validate_config, EngineConfig};
//! use unified_engine::errors::ValidationError;
//!
//! let config = EngineConfig {
//!     cache_capacity: 0,
//!     io_pool_size: 0,
//!     ..EngineConfig::default()
//! };
//!
//! let errors = validate_config(&config).unwrap_err();
//! assert_eq!(
//!     errors,
//!     vec![
//!         ValidationError::ZeroCacheCapacity,
//!         ValidationError::ZeroPoolSize { pool: "io" },
//!     ]
//! );
//! ```

use std::collections::HashSet;

use crate::backends::local::LocalProcessorFactory;
use crate::config::EngineConfig;
use crate::errors::ValidationError;

/// Validates an engine configuration.
///
/// # Returns
/// * `Ok(())` if every check passes
/// * `Err(Vec<ValidationError>)` with every failure, in check order
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.cache_capacity == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }
    if config.io_pool_size == 0 {
        errors.push(ValidationError::ZeroPoolSize { pool: "io" });
    }
    if config.cpu_pool_size == 0 {
        errors.push(ValidationError::ZeroPoolSize { pool: "cpu" });
    }
    if config.batch_size == 0 {
        errors.push(ValidationError::ZeroBatchSize);
    }

    errors.extend(validate_processors(config));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_processors(config: &EngineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for p in &config.processors {
        if !seen.insert(p.source_type.as_str()) {
            errors.push(ValidationError::DuplicateSourceType {
                source_type: p.source_type.clone(),
            });
        }
        if !LocalProcessorFactory::is_implementation_available(&p.processor) {
            errors.push(ValidationError::UnknownProcessor {
                source_type: p.source_type.clone(),
                processor: p.processor.clone(),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessorConfig;
    use std::collections::HashMap;

    fn processor(source_type: &str, processor: &str) -> ProcessorConfig {
        ProcessorConfig {
            source_type: source_type.to_string(),
            processor: processor.to_string(),
            compatible_sources: vec![],
            options: HashMap::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_validation_table_driven() {
        struct TestCase {
            name: &'static str,
            config: EngineConfig,
            expected: Vec<ValidationError>,
        }

        let test_cases = vec![
            TestCase {
                name: "zero cpu pool",
                config: EngineConfig {
                    cpu_pool_size: 0,
                    ..EngineConfig::default()
                },
                expected: vec![ValidationError::ZeroPoolSize { pool: "cpu" }],
            },
            TestCase {
                name: "zero batch size",
                config: EngineConfig {
                    batch_size: 0,
                    ..EngineConfig::default()
                },
                expected: vec![ValidationError::ZeroBatchSize],
            },
            TestCase {
                name: "duplicate source type",
                config: EngineConfig {
                    processors: vec![processor("social", "echo"), processor("social", "echo")],
                    ..EngineConfig::default()
                },
                expected: vec![ValidationError::DuplicateSourceType {
                    source_type: "social".to_string(),
                }],
            },
            TestCase {
                name: "unknown implementation",
                config: EngineConfig {
                    processors: vec![processor("payments", "fraud_model")],
                    ..EngineConfig::default()
                },
                expected: vec![ValidationError::UnknownProcessor {
                    source_type: "payments".to_string(),
                    processor: "fraud_model".to_string(),
                }],
            },
            TestCase {
                name: "everything wrong at once",
                config: EngineConfig {
                    cache_capacity: 0,
                    io_pool_size: 0,
                    cpu_pool_size: 0,
                    batch_size: 0,
                    processors: vec![processor("a", "nope")],
                    ..EngineConfig::default()
                },
                expected: vec![
                    ValidationError::ZeroCacheCapacity,
                    ValidationError::ZeroPoolSize { pool: "io" },
                    ValidationError::ZeroPoolSize { pool: "cpu" },
                    ValidationError::ZeroBatchSize,
                    ValidationError::UnknownProcessor {
                        source_type: "a".to_string(),
                        processor: "nope".to_string(),
                    },
                ],
            },
        ];

        for case in test_cases {
            let errors = validate_config(&case.config).unwrap_err();
            assert_eq!(errors, case.expected, "case: {}", case.name);
        }
    }
}
