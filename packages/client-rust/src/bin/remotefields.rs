//! `remotefields` — enrich a JSON document of records with remote fields.
//!
//! Usage:
//!
//! ```text
//! remotefields --definition serializer.json --input records.json \
//!     --base-url http://127.0.0.1:9191/ \
//!     --endpoint some__endpoint_list=some/endpoint-list/ \
//!     --endpoint some__endpoint_detail=some/endpoint-detail/
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use remotefields_client::{enrich_document, ClientConfig, RemoteClient, SerializerDef};
use remotefields_core::{EngineConfig, RemoteResolutionEngine, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "remotefields", version, about = "Enrich JSON records with fields fetched from a companion service")]
struct Cli {
    /// Serializer definition (JSON).
    #[arg(long)]
    definition: PathBuf,

    /// Records to serialize: a JSON object or an array of objects.
    #[arg(long)]
    input: PathBuf,

    /// Root URL of the companion service.
    #[arg(long, env = "REMOTEFIELDS_BASE_URL", default_value = "http://127.0.0.1:8000/")]
    base_url: String,

    /// Basic-auth user.
    #[arg(long, env = "REMOTEFIELDS_USER")]
    user: Option<String>,

    /// Basic-auth password.
    #[arg(long, env = "REMOTEFIELDS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Named endpoint as `name=path`; repeatable.
    #[arg(long = "endpoint", value_parser = parse_endpoint)]
    endpoints: Vec<(String, String)>,

    /// Per-call timeout in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Fetch independent remote fields concurrently.
    #[arg(long)]
    parallel: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

fn parse_endpoint(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), path.to_string()))
        }
        _ => Err(format!("expected `name=path`, got `{raw}`")),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = ClientConfig {
        base_url: cli.base_url,
        username: cli.user,
        password: cli.password,
        request_timeout: Duration::from_millis(cli.timeout_ms),
        endpoints: cli.endpoints.into_iter().collect::<HashMap<_, _>>(),
        ..ClientConfig::default()
    };
    let client = RemoteClient::new(config)?;

    let definition = SerializerDef::from_json(&read(&cli.definition)?)
        .with_context(|| format!("invalid definition {}", cli.definition.display()))?;
    let serializer = definition.compile(&client)?;

    let document: Value = serde_json::from_str(&read(&cli.input)?)
        .with_context(|| format!("invalid JSON in {}", cli.input.display()))?;

    let engine = RemoteResolutionEngine::new(EngineConfig {
        parallel_fetch: cli.parallel,
    });
    let view = enrich_document(&serializer, &engine, document).await?;
    info!(records = view.len(), "document enriched");

    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
