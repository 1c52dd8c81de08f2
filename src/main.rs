// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Result;
use std::collections::HashMap;
use std::env;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unified_engine::config::{load_and_validate_config, EngineConfig, ProcessorConfig, RuntimeBuilder};
use unified_engine::engine::{ContentHash, DataNode, Priority, ProcessingResult};

/// Processors used when no config file is given
fn default_processors() -> Vec<ProcessorConfig> {
    let fields = serde_yaml::Value::Sequence(vec!["author".into(), "text".into()]);
    vec![
        ProcessorConfig {
            source_type: "social".to_string(),
            processor: "select_fields".to_string(),
            compatible_sources: vec!["twitter".to_string(), "instagram".to_string()],
            options: HashMap::from([("fields".to_string(), fields)]),
        },
        ProcessorConfig {
            source_type: "payments".to_string(),
            processor: "echo".to_string(),
            compatible_sources: vec!["card".to_string(), "wire".to_string()],
            options: HashMap::new(),
        },
        ProcessorConfig {
            source_type: "metrics".to_string(),
            processor: "echo".to_string(),
            compatible_sources: vec![],
            options: HashMap::new(),
        },
    ]
}

fn tweet(id: &str, author: &str, text: &str) -> Result<DataNode> {
    let payload = serde_json::json!({ "author": author, "text": text });
    Ok(DataNode::new(id, "twitter", Priority::High)
        .with_content_hash(ContentHash::of_json(&payload)?)
        .with_metadata("author", serde_json::json!(author))
        .with_metadata("text", serde_json::json!(text)))
}

/// A payment, two metrics rows that depend on it, a report over the rows,
/// and a tweet.
fn demo_nodes() -> Result<Vec<DataNode>> {
    Ok(vec![
        DataNode::new("report-daily", "metrics", Priority::Low)
            .with_dependencies(["cpu-web-1", "cpu-web-2"]),
        DataNode::new("cpu-web-1", "metrics", Priority::Medium)
            .with_dependency("txn-1001")
            .with_metadata("host", serde_json::json!("web-1"))
            .with_metadata("cpu", serde_json::json!(0.42)),
        DataNode::new("cpu-web-2", "metrics", Priority::Medium)
            .with_dependency("txn-1001")
            .with_metadata("host", serde_json::json!("web-2"))
            .with_metadata("cpu", serde_json::json!(0.87)),
        DataNode::new("txn-1001", "card", Priority::Critical)
            .with_metadata("amount", serde_json::json!(129.99))
            .with_metadata("currency", serde_json::json!("EUR")),
        tweet("tweet-1", "ana", "shipping the new engine today")?,
    ])
}

fn print_result(result: &ProcessingResult) {
    if result.success {
        println!(
            "  ✅ {:<14} {:<14} pool={:<4} {:?}",
            result.node_id,
            result.processor.as_deref().unwrap_or("-"),
            result.pool.as_str(),
            result.elapsed
        );
    } else {
        let error = result
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
        println!("  ❌ {:<14} {}", result.node_id, error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => load_and_validate_config(path)?,
        None => EngineConfig {
            batch_size: 4,
            processors: default_processors(),
            ..EngineConfig::default()
        },
    };

    println!("🚀 Unified Engine Demo");
    println!("═══════════════════════════════════");
    println!(
        "Pools: io={} cpu={}  batch_size={}  cache_capacity={}",
        config.io_pool_size, config.cpu_pool_size, config.batch_size, config.cache_capacity
    );
    println!();

    let mut engine = RuntimeBuilder::from_config(&config)?;
    for node in demo_nodes()? {
        let id = engine.submit(node)?;
        println!("📥 submitted {}", id);
    }

    let started = Instant::now();
    let mut batch = 0;
    while !engine.is_idle() {
        batch += 1;
        println!("\n📦 Batch {}", batch);
        for result in engine.process_batch(config.batch_size).await {
            print_result(&result);
        }

        if batch == 1 {
            // identical content to tweet-1, which has completed by now
            let id = engine.submit(tweet("tweet-1-repost", "ana", "shipping the new engine today")?)?;
            println!(
                "  ♻️  {} submitted as duplicate -> {:?}",
                id,
                engine.state(&id)
            );
        }
    }

    println!("\n⏱️  Drained in {:?}", started.elapsed());
    let metrics = engine.shutdown().await;
    println!("\n📊 Metrics");
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    Ok(())
}
