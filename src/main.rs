//! Zentinel Header Mutator Agent CLI entry point.
//!
//! Validates configuration or serves an echo pipeline with the mutator in
//! front of it.

use anyhow::{Context, Result};
use axum::{body::Body, http::Request, middleware, routing::any, Json, Router};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zentinel_agent_header_mutator::middleware::mutate_request_headers;
use zentinel_agent_header_mutator::{HeaderMutatorAgent, MutatorConfig};

#[derive(Parser, Debug)]
#[command(name = "zentinel-agent-header-mutator")]
#[command(author, version, about = "Request header mutation agent for Zentinel")]
struct Args {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to serve the echo pipeline on
    #[arg(long, env = "HEADER_MUTATOR_LISTEN", default_value = "127.0.0.1:8080")]
    listen: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit.
    #[arg(long)]
    example_config: bool,

    /// Validate configuration and exit.
    #[arg(long)]
    validate: bool,
}

fn print_example_config() {
    let example = r#"# Header Mutator Agent Configuration Example
version: "1"

# Applied in order. A later mutation writing the same header wins.
mutations:
  # Rewrite every Location value in place
  - header: Location
    regex: "^http://(.+)$"
    replacement: "https://$1"

  # Clone Host into X-Forwarded-Host
  - header: Host
    newName: X-Forwarded-Host

  # Move X-Api-Key to Authorization
  - header: X-Api-Key
    newName: Authorization
    regex: "^(.+)$"
    replacement: "Bearer $1"
    deleteSource: true

# Applied after mutations. Values are appended, never replaced.
fromUrlMutations:
  - header: X-Original-Url
    regex: "^(.*)$"
    replacement: "$1"
  - header: X-Api-Version
    regex: "^https?://[^/]+/api/(v[0-9]+)/.*$"
    replacement: "$1"
"#;
    println!("{}", example);
}

fn load_config(path: &Path) -> Result<MutatorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };
    Ok(config)
}

/// Next stage of the echo pipeline: reports the headers it received.
async fn echo_headers(req: Request<Body>) -> Json<BTreeMap<String, Vec<String>>> {
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in req.headers() {
        headers
            .entry(name.to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    Json(headers)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    if args.example_config {
        print_example_config();
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => MutatorConfig::default(),
    };

    let agent = HeaderMutatorAgent::new(config).context("Invalid mutation rules")?;

    if args.validate {
        info!(rules = agent.rules().len(), "Configuration is valid");
        return Ok(());
    }

    let agent = Arc::new(agent);
    let app = Router::new()
        .route("/", any(echo_headers))
        .route("/{*path}", any(echo_headers))
        .layer(middleware::from_fn_with_state(
            agent.clone(),
            mutate_request_headers,
        ));

    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;

    info!(
        config = ?args.config,
        address = %args.listen,
        "Starting Zentinel Header Mutator Agent"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let metrics = agent.metrics();
    info!(
        requests_total = metrics.requests_total,
        requests_mutated = metrics.requests_mutated,
        "Header mutator agent stopped"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_by_extension() {
        let dir = std::env::temp_dir().join(format!("header-mutator-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let yaml = dir.join("mutator.yaml");
        std::fs::write(&yaml, "mutations:\n  - header: Host\n    newName: X-Host\n").unwrap();
        let config = load_config(yaml.as_path()).unwrap();
        assert_eq!(config.mutations.len(), 1);

        let json = dir.join("mutator.json");
        std::fs::write(&json, r#"{"fromUrlMutations":[{"header":"X-Url","regex":"(.*)","replacement":"$1"}]}"#)
            .unwrap();
        let config = load_config(&json).unwrap();
        assert_eq!(config.from_url_mutations.len(), 1);

        assert!(load_config(Path::new("/nonexistent/mutator.yaml")).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
