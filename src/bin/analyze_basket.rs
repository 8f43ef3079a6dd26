use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;
use eyre::WrapErr;
use tracing::info;

use etf_basket_analyzer::basket::analyze;
use etf_basket_analyzer::config;
use etf_basket_analyzer::logging;
use etf_basket_analyzer::prices::load_price_table;

/// Run one basket analysis from files and print the result as JSON.
#[derive(Parser, Debug)]
struct Args {
    /// Weights CSV with `name` and `weight` columns.
    #[arg(long)]
    weights: PathBuf,

    /// Price table CSV. Defaults to PRICES_PATH.
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    logging::init_logging(env!("CARGO_BIN_NAME").to_string())?;

    let args = Args::parse();
    let prices_path = match args.prices {
        Some(path) => path,
        None => config::Config::load()?.prices_path,
    };

    let prices = load_price_table(&prices_path)
        .wrap_err_with(|| format!("Failed to load {}", prices_path.display()))?;

    let raw = std::fs::read(&args.weights)
        .wrap_err_with(|| format!("Failed to read {}", args.weights.display()))?;
    let result = analyze(&raw, &prices)?;
    info!(
        holdings = result.holdings.len(),
        unmatched = result.unmatched.len(),
        "Analysis finished"
    );

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");

    Ok(())
}
