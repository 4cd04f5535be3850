// squadbuild entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr; stdout carries only JSON)
// 2. Load config, copying defaults on first run
// 3. Load the prediction table
// 4. Read the request and apply command-line overrides
// 5. Solve and print the response or the error report

use squadbuild_app::app::{self, Overrides};
use squadbuild_app::config;
use squadbuild_app::predictions;
use squadbuild_app::report::{self, ErrorResponse};
use squadbuild_app::request::SquadRequest;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Pick the highest-predicted squad that fits the budget and position quotas.
#[derive(Debug, Parser)]
#[command(name = "squadbuild", version, about)]
struct Cli {
    /// Directory holding `config/` and `defaults/`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Prediction CSV; overrides `data.predictions` from config.
    #[arg(long, value_name = "CSV")]
    predictions: Option<PathBuf>,

    /// JSON request with counts, budget and forced lists.
    #[arg(long, value_name = "JSON")]
    request: Option<PathBuf>,

    /// Budget cap, in the cost units of the prediction table.
    #[arg(long, value_name = "N")]
    budget: Option<f64>,

    /// Player that must be selected (repeatable).
    #[arg(long = "include", value_name = "ID")]
    include: Vec<String>,

    /// Player that must not be selected (repeatable).
    #[arg(long = "exclude", value_name = "ID")]
    exclude: Vec<String>,

    /// Number of top players listed per position (default: the quota).
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // 1. Initialize tracing
    init_tracing()?;

    // 2. Load config
    let config = config::load_config(&cli.config_dir).context("failed to load configuration")?;
    info!(
        "config loaded: budget {}, quotas {:?}",
        config.squad.budget, config.squad.quotas
    );

    // 3. Load predictions
    let predictions_path = cli
        .predictions
        .clone()
        .unwrap_or_else(|| cli.config_dir.join(&config.data.predictions));
    let rows = predictions::load_predictions(&predictions_path)
        .with_context(|| format!("failed to load predictions from {}", predictions_path.display()))?;
    info!("loaded {} prediction rows", rows.len());

    // 4. Request and overrides
    let request = match &cli.request {
        Some(path) => SquadRequest::load(path).context("failed to load request")?,
        None => SquadRequest::default(),
    };
    let overrides = Overrides {
        budget: cli.budget,
        include: cli.include.clone(),
        exclude: cli.exclude.clone(),
        top: cli.top,
    };
    let pretty = cli.pretty || config.output.pretty;

    // 5. Solve
    match app::handle_request(&config, rows, request, &overrides) {
        Ok(response) => {
            println!("{}", report::render(&response, pretty)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{} ({}): {}", e.kind(), e.code(), e);
            println!("{}", report::render(&ErrorResponse::from(&e), pretty)?);
            Ok(ExitCode::from(2))
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squadbuild=info,squadbuild_app=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
