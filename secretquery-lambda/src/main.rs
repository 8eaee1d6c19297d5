//! SecretQuery - Secrets Manager backed query Lambda
//!
//! Serves the Lambda Runtime API by default. With `--event`, runs a single
//! invocation locally and prints the response envelope.

use anyhow::Context as _;
use clap::Parser;
use lambda_runtime::{service_fn, Context, LambdaEvent};
use secretquery_lambda::{invoke, parse_event, Overrides, Settings};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "secretquery")]
#[command(about = "Secrets Manager backed query Lambda", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./secretquery.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Region the Secrets Manager client is bound to
    #[arg(long)]
    region: Option<String>,

    /// Secret holding the query credentials
    #[arg(long)]
    secret_name: Option<String>,

    /// Secrets Manager endpoint override
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Invoke once with the JSON event in this file ("-" for stdin) and exit
    #[arg(long)]
    event: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            region: self.region.clone(),
            secret_name: self.secret_name.clone(),
            endpoint_url: self.endpoint_url.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref())
        .context("loading settings")?
        .with_overrides(args.overrides());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("secretquery={}", settings.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    info!(
        region = %settings.region,
        secret_name = %settings.secret_name,
        "Starting SecretQuery"
    );

    if let Some(path) = args.event {
        return invoke_once(&settings, &path).await;
    }

    let settings = Arc::new(settings);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let settings = settings.clone();
        async move { invoke(&settings, event).await }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}

/// Run one invocation with a synthetic context and print the envelope
async fn invoke_once(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let event = local_event(read_event(path, std::io::stdin().lock())?);

    let envelope = invoke(settings, event)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Read an event from `path`, or from `stdin` when the path is `-`
fn read_event(path: &Path, mut stdin: impl Read) -> anyhow::Result<Value> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        stdin
            .read_to_string(&mut buf)
            .context("reading event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading event file {}", path.display()))?
    };

    parse_event(&raw).context("parsing event JSON")
}

fn local_event(payload: Value) -> LambdaEvent<Value> {
    let mut context = Context::default();
    context.request_id = "local-invoke".to_string();
    LambdaEvent::new(payload, context)
}
