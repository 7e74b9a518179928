use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use jsonapi_store::document::ErrorObject;
use jsonapi_store::network::Headers;
use jsonapi_store::store::SyncResult;
use jsonapi_store::{Config, JsonApiClient, Record, RequestOptions};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "jsonapi-store.log";

/// Fetch a JSON:API document and print the normalized record graph
#[derive(Parser, Debug)]
#[command(name = "jsonapi-store", version, about, long_about = None)]
struct Args {
    /// URL to read (absolute, or relative to the base URL)
    url: String,

    /// Base URL for relative URLs (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Extra request header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Relationship path to side-load (repeatable)
    #[arg(short, long)]
    include: Vec<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Persist --base-url into the config file
    #[arg(long, requires = "base_url")]
    remember: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{}`", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{}`", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn setup_logging(level: LogLevel) -> Option<WorkerGuard> {
    let filter = level.as_filter()?;
    let log_dir = log_dir();

    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(&log_dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Cannot open log file in {:?}: {}", log_dir, e);
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG wins over --log-level when set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::debug!("logging to {:?}", log_dir.join(LOG_FILE));
    Some(guard)
}

/// The log lives next to the config file
fn log_dir() -> PathBuf {
    Config::config_path()
        .and_then(|path| path.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// What gets printed
#[derive(Serialize)]
struct Report<'a> {
    status: Option<u16>,
    error: Option<String>,
    data: &'a SyncResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a Value>,
    errors: &'a [ErrorObject],
    records: Vec<&'a Record>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();
    if let Some(base_url) = &args.base_url {
        if args.remember {
            config
                .set_base_url(base_url)
                .context("Failed to save configuration")?;
        } else {
            config.base_url = base_url.clone();
        }
    }

    tracing::info!("Using base URL: {}", config.base_url);

    let store = config.store().shared();
    let client = JsonApiClient::new(config)?;

    let headers: Headers = args.headers.into_iter().collect();
    let options = args
        .include
        .iter()
        .fold(RequestOptions::new(), |options, path| options.include(path));

    let envelope = client
        .read(
            &store,
            &args.url,
            (!headers.is_empty()).then_some(&headers),
            Some(&options),
        )
        .await;

    let store = store.lock().await;
    let report = Report {
        status: envelope.status,
        error: envelope.error.as_ref().map(|e| e.to_string()),
        data: &envelope.data,
        meta: envelope.meta.as_ref(),
        errors: &envelope.errors,
        records: store.iter().collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(error) = &envelope.error {
        anyhow::bail!("Request failed: {}", error);
    }

    Ok(())
}
