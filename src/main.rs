use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mail2issue::config::AppConfig;
use mail2issue::context::AppContext;
use mail2issue::pipeline::types::BatchEvent;
use mail2issue::pipeline::{EmailProcessor, process_batch};

/// Process one batch of inbound-mail notifications and print the batch
/// response.
#[derive(Debug, Parser)]
#[command(name = "mail2issue", version)]
struct Args {
    /// Batch event JSON file; read from stdin when omitted.
    #[arg(long, value_name = "PATH")]
    event: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json);

    let config = AppConfig::from_env().context("invalid configuration")?;
    let ctx = AppContext::from_config(&config)
        .await
        .context("failed to initialize clients")?;
    let processor = EmailProcessor::new(Arc::new(ctx));

    let raw = read_event(args.event.as_deref())?;
    let event: BatchEvent = serde_json::from_str(&raw).context("invalid batch event")?;

    let response = process_batch(&processor, &event).await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_event(path: Option<&std::path::Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event file {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read event from stdin")?;
            Ok(raw)
        }
    }
}
