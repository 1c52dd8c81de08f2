// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::DataNode;
use crate::traits::Processor;

/// Configuration for the Select Fields processor
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SelectFieldsConfig {
    pub fields: Vec<String>,
    /// Fail when a listed field is missing instead of skipping it
    #[serde(default)]
    pub strict: bool,
}

/// Select Fields processor - projects a fixed set of metadata keys
pub struct SelectFieldsProcessor {
    config: SelectFieldsConfig,
}

impl SelectFieldsProcessor {
    pub fn new(config: SelectFieldsConfig) -> Self {
        Self { config }
    }

    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(SelectFieldsConfig {
            fields: fields.into_iter().map(Into::into).collect(),
            strict: false,
        })
    }

    pub fn config(&self) -> &SelectFieldsConfig {
        &self.config
    }
}

#[async_trait]
impl Processor for SelectFieldsProcessor {
    async fn process(&self, node: &DataNode) -> anyhow::Result<serde_json::Value> {
        let mut selected = serde_json::Map::new();

        for field in &self.config.fields {
            match node.metadata.get(field) {
                Some(value) => {
                    selected.insert(field.clone(), value.clone());
                }
                None if self.config.strict => {
                    anyhow::bail!("node '{}' has no field '{}'", node.id, field)
                }
                None => {}
            }
        }

        Ok(serde_json::Value::Object(selected))
    }

    fn name(&self) -> &str {
        "select_fields"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Priority;

    fn row() -> DataNode {
        DataNode::new("row-1", "metrics", Priority::Low)
            .with_metadata("cpu", serde_json::json!(0.75))
            .with_metadata("mem", serde_json::json!(512))
            .with_metadata("host", serde_json::json!("web-1"))
    }

    #[tokio::test]
    async fn test_select_fields_projection() {
        let test_cases = vec![
            (vec!["cpu"], serde_json::json!({ "cpu": 0.75 })),
            (vec!["cpu", "host"], serde_json::json!({ "cpu": 0.75, "host": "web-1" })),
            (vec!["disk"], serde_json::json!({})),
        ];

        for (fields, expected) in test_cases {
            let processor = SelectFieldsProcessor::with_fields(fields.clone());
            let output = processor.process(&row()).await.unwrap();
            assert_eq!(output, expected, "fields: {:?}", fields);
        }
    }

    #[tokio::test]
    async fn test_strict_missing_field_fails() {
        let processor = SelectFieldsProcessor::new(SelectFieldsConfig {
            fields: vec!["disk".to_string()],
            strict: true,
        });

        let err = processor.process(&row()).await.unwrap_err();
        assert!(err.to_string().contains("no field 'disk'"));
    }
}
