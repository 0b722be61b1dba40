use anyhow::{bail, Context, Result};
use ferroflux_telegram::{
    EnvCredentialStore, HttpDispatcher, InputRecord, NodeConfig, NodeType, TelegramNode,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Run file: `{ items: [ { parameters: { ... } } ] }` as YAML or JSON.
#[derive(Debug, Deserialize)]
struct RunFile {
    #[serde(default)]
    items: Vec<InputRecord>,
}

fn usage() -> &'static str {
    "usage: ferroflux-telegram-playground <describe | run <file>>"
}

fn load_run_file(path: &Path) -> Result<RunFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run file: {:?}", path))?;
    // YAML is a superset of JSON
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse run file: {:?}", path))
}

async fn run(node: &TelegramNode, path: &Path) -> Result<()> {
    let run_file = load_run_file(path)?;

    for (index, item) in run_file.items.iter().enumerate() {
        for issue in node.description().validate(&item.parameters) {
            tracing::warn!(
                item_index = index,
                parameter = %issue.parameter,
                "{}",
                issue.message
            );
        }
    }

    let config = NodeConfig::from_env()?;
    let credentials = Arc::new(EnvCredentialStore::new(config.access_token_env.clone()));
    let dispatcher = HttpDispatcher::new(&config, credentials)?;

    let outputs = node.execute(&dispatcher, &run_file.items).await?;
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let node = TelegramNode::new()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("describe") => {
            let output = serde_json::json!({
                "metadata": node.description().metadata(),
                "description": node.description(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Some("run") => {
            let Some(path) = args.get(1) else {
                bail!(usage());
            };
            run(&node, Path::new(path)).await
        }
        _ => bail!(usage()),
    }
}
