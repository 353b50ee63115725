//! Batch Dispatch Harness
//!
//! Runs a JSON batch through the dispatch core against the dry-run client
//! and prints the output sequence. Every remote call is recorded and echoed
//! back instead of reaching the chat service.
//!
//! Usage:
//!   cargo run --features cli --bin dispatch_batch -- \
//!     --items batch.json \
//!     --continue-on-fail \
//!     --pretty
//!
//! `batch.json` is an array of objects, each carrying `resource`,
//! `operation` and the operation's named parameters. Credentials come from
//! `<CREDENTIAL_ID>_API_KEY` / `<CREDENTIAL_ID>_API_SECRET` (default id
//! `stream_chat`); a `.env` file is honoured.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use chat_dispatch::{
    operation_registry, run_batch, BatchError, DryRunClientFactory, EnvCredentialProvider,
    ExecutionConfig, JsonItems,
};

#[derive(Parser, Debug)]
#[command(name = "dispatch_batch")]
#[command(about = "Dispatch a batch of chat operations (dry run)")]
struct Args {
    /// JSON array of items; `-` reads stdin
    #[arg(long, short = 'i', required_unless_present = "list_operations")]
    items: Option<PathBuf>,

    /// YAML execution config
    #[arg(long, short = 'c', env = "CHAT_DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Isolate failing items instead of aborting the batch
    #[arg(long)]
    continue_on_fail: bool,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,

    /// Print the operation catalog and exit
    #[arg(long)]
    list_operations: bool,
}

fn read_items(path: &Path) -> Result<JsonItems> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read items from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    JsonItems::from_json_str(&content).context("Items must be a JSON array of objects")
}

fn load_config(args: &Args) -> Result<ExecutionConfig> {
    let config = match &args.config {
        Some(path) => ExecutionConfig::from_yaml_file(path)?,
        None => ExecutionConfig::default(),
    };
    let mut config = config.with_env_overrides()?;

    // Flags win over file and environment
    if args.continue_on_fail {
        config.continue_on_fail = true;
    }
    if let Some(secs) = args.timeout_secs {
        config.call_timeout = Some(Duration::from_secs(secs));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_operations {
        for (key, description) in operation_registry().list() {
            println!("{:<40} {description}", key.to_string());
        }
        return Ok(());
    }

    let Some(items_path) = args.items.as_ref() else {
        anyhow::bail!("--items is required");
    };
    let items = read_items(items_path)?;
    let config = load_config(&args)?;

    let factory = DryRunClientFactory::default();
    let output = match run_batch(&EnvCredentialProvider::new(), &factory, &items, &config).await {
        Ok(output) => output,
        Err(BatchError::Aborted(err)) => {
            eprintln!("Batch aborted at item {}: {}", err.item_index, err);
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");

    Ok(())
}
