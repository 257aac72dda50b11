//! EV gateway CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration** from `evgw.toml`, `--config` and `EVGW__*`.
//! 2. **Wire observability**: `tracing-subscriber` with an `EVGW_LOG`
//!    filter, plus an OpenTelemetry OTLP exporter when configured.
//! 3. **Construct services**: gRPC channels, the optional durable
//!    orchestrators, and the mock fallbacks (see [`wiring`]).
//! 4. **Run one request** (`search` or `estimate`) under the configured
//!    end-to-end deadline, print the response as JSON, and exit non-zero on
//!    failure. Ctrl-C cancels the in-flight request.

mod config;
mod telemetry;
mod wiring;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gateway::{
    CallContext, Energy, EstimateRequest, GatewayError, MessageId, Page, RequestMeta,
    SearchRequest, TransactionId,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Instrument;

use crate::config::GatewayConfig;
use crate::wiring::Services;

#[derive(Debug, Parser)]
#[command(name = "evgw", version, about = "EV-charging gateway request dispatch")]
struct Cli {
    /// Configuration file layered over `evgw.toml`.
    #[arg(long, env = config::CONFIG_ENV_VAR, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find charging stations by EVSE id or by location.
    Search(SearchArgs),
    /// Quote a charging session.
    Estimate(EstimateArgs),
    /// Print the effective configuration as JSON.
    Config,
}

#[derive(Debug, Args)]
struct Correlation {
    /// Transaction id to reuse across retries; generated when absent.
    #[arg(long)]
    transaction_id: Option<String>,
    /// Message id of the first send; generated when absent.
    #[arg(long)]
    message_id: Option<String>,
}

impl Correlation {
    fn apply(&self, meta: &mut RequestMeta) {
        if let Some(id) = self.transaction_id.clone().and_then(TransactionId::new) {
            meta.transaction_id = Some(id);
        }
        if let Some(id) = self.message_id.clone().and_then(MessageId::new) {
            meta.message_id = Some(id);
        }
    }
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// JSON request body; the locator flags are ignored when given.
    #[arg(long)]
    request: Option<PathBuf>,
    #[arg(long)]
    evse_id: Option<String>,
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
    /// Search radius in meters.
    #[arg(long)]
    distance: Option<f64>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    per_page: Option<u32>,
    #[command(flatten)]
    correlation: Correlation,
}

impl SearchArgs {
    fn into_request(self) -> anyhow::Result<(Page, SearchRequest)> {
        let mut request = match &self.request {
            Some(path) => read_json::<SearchRequest>(path)?,
            None => SearchRequest {
                evse_id: self.evse_id,
                geo_coordinates: self.lat.zip(self.lon).map(|(lat, lon)| vec![lat, lon]),
                distance_meters: self.distance,
                ..SearchRequest::default()
            },
        };
        self.correlation.apply(&mut request.meta);
        Ok((Page::new(self.page, self.per_page), request))
    }
}

#[derive(Debug, Args)]
struct EstimateArgs {
    /// JSON request body; the other request flags are ignored when given.
    #[arg(long)]
    request: Option<PathBuf>,
    #[arg(long, required_unless_present = "request")]
    evse_id: Option<String>,
    #[arg(long)]
    connector_id: Option<String>,
    #[arg(long)]
    offer_id: Option<String>,
    /// Energy to deliver, in kWh.
    #[arg(long)]
    energy_kwh: Option<f64>,
    #[command(flatten)]
    correlation: Correlation,
}

impl EstimateArgs {
    fn into_request(self) -> anyhow::Result<EstimateRequest> {
        let mut request = match &self.request {
            Some(path) => read_json::<EstimateRequest>(path)?,
            None => EstimateRequest {
                evse_id: self.evse_id.unwrap_or_default(),
                connector_id: self.connector_id.unwrap_or_default(),
                offer_id: self.offer_id,
                energy: self.energy_kwh.map(|value| Energy {
                    value,
                    unit: "kWh".to_string(),
                }),
                ..EstimateRequest::default()
            },
        };
        self.correlation.apply(&mut request.meta);
        Ok(request)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("invalid request body in {}", path.display()))
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    error: &'a GatewayError,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the outcome of a request and returns the process exit code.
fn report<T: Serialize>(outcome: Result<T, GatewayError>) -> anyhow::Result<ExitCode> {
    match outcome {
        Ok(response) => {
            print_json(&response)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            print_json(&ErrorBody {
                status: error.http_status(),
                error: &error,
            })?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn request_context(config: &GatewayConfig, meta: &RequestMeta) -> CallContext {
    let mut ctx = CallContext::new().with_timeout(config.request_timeout());
    if let Some(transaction_id) = meta.transaction_id.clone() {
        ctx = ctx.with_transaction_id(transaction_id);
    }

    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling request");
            interrupt.cancel();
        }
    });
    ctx
}

async fn run(
    command: Command,
    config: &GatewayConfig,
    services: &Services,
) -> anyhow::Result<ExitCode> {
    match command {
        Command::Search(args) => {
            let (page, request) = args.into_request()?;
            if let Err(e) = request.validate() {
                return report::<()>(Err(e));
            }
            let ctx = request_context(config, &request.meta);
            let span = tracing::info_span!("search", transaction_id = %ctx.transaction_id());
            report(
                services
                    .search
                    .search(&ctx, page, &request)
                    .instrument(span)
                    .await,
            )
        }
        Command::Estimate(args) => {
            let request = args.into_request()?;
            let ctx = request_context(config, &request.meta);
            let span = tracing::info_span!("estimate", transaction_id = %ctx.transaction_id());
            report(
                services
                    .estimate
                    .estimate(&ctx, &request)
                    .instrument(span)
                    .await,
            )
        }
        Command::Config => {
            print_json(config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config =
        GatewayConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let _telemetry = telemetry::init(&config.telemetry)?;

    let services = Services::build(&config).context("invalid gateway configuration")?;
    let exit = run(cli.command, &config, &services).await;
    services.shutdown().await;
    exit
}
