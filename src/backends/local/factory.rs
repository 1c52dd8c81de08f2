use std::sync::Arc;

use super::processors::*;
use crate::config::ProcessorConfig;
use crate::traits::Processor;

/// Factory for creating local (in-process) processor instances
pub struct LocalProcessorFactory;

impl LocalProcessorFactory {
    /// Create a processor instance from configuration
    ///
    /// The `processor` field in the config determines which processor to create:
    /// - "echo" -> EchoProcessor
    /// - "select_fields" -> SelectFieldsProcessor (requires a `fields` option)
    pub fn create_processor(config: &ProcessorConfig) -> Result<Arc<dyn Processor>, String> {
        match config.processor.as_str() {
            "echo" => Ok(Arc::new(EchoProcessor::new())),

            "select_fields" => {
                let options = serde_yaml::to_value(&config.options)
                    .map_err(|e| format!("Invalid options for '{}': {}", config.source_type, e))?;
                let select: SelectFieldsConfig = serde_yaml::from_value(options).map_err(|e| {
                    format!(
                        "select_fields for '{}' needs a 'fields' list: {}",
                        config.source_type, e
                    )
                })?;
                Ok(Arc::new(SelectFieldsProcessor::new(select)))
            }

            other => Err(format!("Unknown local processor implementation: '{}'", other)),
        }
    }

    /// List all available local processor implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec!["echo", "select_fields"]
    }

    /// Check if an implementation is available
    pub fn is_implementation_available(impl_name: &str) -> bool {
        Self::list_available_implementations().contains(&impl_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DataNode, Priority};
    use std::collections::HashMap;

    fn create_test_config(processor: &str, options: HashMap<String, serde_yaml::Value>) -> ProcessorConfig {
        ProcessorConfig {
            source_type: "test".to_string(),
            processor: processor.to_string(),
            compatible_sources: vec![],
            options,
        }
    }

    #[tokio::test]
    async fn test_create_echo_processor() {
        let processor =
            LocalProcessorFactory::create_processor(&create_test_config("echo", HashMap::new()))
                .expect("Failed to create echo processor");

        assert_eq!(processor.name(), "echo");
        let node = DataNode::new("n", "test", Priority::Low);
        let output = processor.process(&node).await.unwrap();
        assert_eq!(output["source_type"], "test");
    }

    #[tokio::test]
    async fn test_create_select_fields_from_options() {
        let options = HashMap::from([(
            "fields".to_string(),
            serde_yaml::from_str::<serde_yaml::Value>("[author, text]").unwrap(),
        )]);
        let processor =
            LocalProcessorFactory::create_processor(&create_test_config("select_fields", options))
                .expect("Failed to create select_fields processor");

        let node = DataNode::new("post", "test", Priority::High)
            .with_metadata("author", serde_json::json!("ana"))
            .with_metadata("likes", serde_json::json!(3));
        let output = processor.process(&node).await.unwrap();
        assert_eq!(output, serde_json::json!({ "author": "ana" }));
    }

    #[test]
    fn test_select_fields_without_fields_option_fails() {
        let result =
            LocalProcessorFactory::create_processor(&create_test_config("select_fields", HashMap::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_implementation() {
        let result = LocalProcessorFactory::create_processor(&create_test_config("nope", HashMap::new()));
        match result {
            Err(e) => assert!(e.contains("Unknown local processor implementation: 'nope'")),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_available_implementations() {
        assert!(LocalProcessorFactory::is_implementation_available("echo"));
        assert!(LocalProcessorFactory::is_implementation_available("select_fields"));
        assert!(!LocalProcessorFactory::is_implementation_available("reverse_text"));
    }
}
