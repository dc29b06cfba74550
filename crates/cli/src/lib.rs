pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use procura_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use procura_core::DemandLevel;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use crate::commands::evaluate::EvaluateArgs;
use crate::commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "procura",
    about = "Procurement price aggregation and purchase recommendations",
    long_about = "Aggregate supplier price quotes per item and recommend Buy Now, Consider Buying or Wait.",
    after_help = "Examples:\n  procura items\n  procura recommend --item 101 --supplier TechSource\n  procura doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a procura.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the procurement CSV path")]
    data: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the log level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List items with their supplier counts")]
    Items,
    #[command(about = "Summarize one item's market statistics, fair price and savings")]
    Stats {
        #[arg(long)]
        item: String,
    },
    #[command(about = "Compare supplier quotes for one item")]
    Compare {
        #[arg(long)]
        item: String,
        #[arg(long, help = "Also list suppliers quoting at or below this price")]
        max_price: Option<Decimal>,
    },
    #[command(about = "Recommend whether to buy an item from a chosen supplier")]
    Recommend {
        #[arg(long)]
        item: String,
        #[arg(long)]
        supplier: String,
        #[arg(long, allow_negative_numbers = true, help = "Defaults to the supplier's stock")]
        stock: Option<i64>,
        #[arg(long, help = "low|medium|high; defaults to the supplier's demand level")]
        demand: Option<DemandLevel>,
        #[arg(long, help = "Negotiation margin in (0, 1)")]
        margin: Option<Decimal>,
    },
    #[command(about = "Apply the decision rules to explicit stock, demand and prices")]
    Evaluate {
        #[arg(long, allow_negative_numbers = true)]
        stock: i64,
        #[arg(long)]
        demand: DemandLevel,
        #[arg(long, allow_negative_numbers = true)]
        price: Decimal,
        #[arg(long, allow_negative_numbers = true)]
        average: Decimal,
        #[arg(long, allow_negative_numbers = true)]
        margin: Option<Decimal>,
    },
    #[command(about = "Flag items whose supplier prices vary beyond the configured threshold")]
    Anomalies,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and dataset readability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                csv_path: self.data.clone(),
                negotiation_margin: None,
                log_level: self.log_level.clone(),
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let config = AppConfig::load(options.clone()).unwrap_or_default();
    if let Err(error) = init_logging(&config) {
        eprintln!("logging disabled: {error}");
    }

    let result = match cli.command {
        Command::Items => commands::items::run(&options),
        Command::Stats { item } => commands::stats::run(&options, &item),
        Command::Compare { item, max_price } => commands::compare::run(&options, &item, max_price),
        Command::Recommend { item, supplier, stock, demand, margin } => commands::recommend::run(
            &options,
            &RecommendArgs { item, supplier, stock, demand, margin },
        ),
        Command::Evaluate { stock, demand, price, average, margin } => commands::evaluate::run(
            &options,
            &EvaluateArgs { stock, demand, price, average, margin },
        ),
        Command::Anomalies => commands::anomalies::run(&options),
        Command::Config => commands::config::run(&options),
        Command::Doctor { json } => commands::doctor::run(&options, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber on stderr so stdout carries only command output.
pub fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(log_filter(&config.logging.level, rust_log.as_deref()));

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

/// A valid `RUST_LOG` directive wins over `logging.level`.
fn log_filter(config_level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(config_level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use procura_core::DemandLevel;
    use rust_decimal::Decimal;
    use tracing_subscriber::filter::LevelFilter;

    use super::{log_filter, Cli, Command};

    #[test]
    fn evaluate_accepts_negative_numbers_for_validation_downstream() {
        let cli = Cli::try_parse_from([
            "procura", "evaluate", "--stock", "-3", "--demand", "HIGH", "--price", "10.5",
            "--average", "12",
        ])
        .expect("arguments should parse");

        match cli.command {
            Command::Evaluate { stock, demand, price, margin, .. } => {
                assert_eq!(stock, -3);
                assert_eq!(demand, DemandLevel::High);
                assert_eq!(price, Decimal::new(105, 1));
                assert_eq!(margin, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_data_flag_becomes_a_csv_override() {
        let cli = Cli::try_parse_from(["procura", "items", "--data", "/tmp/quotes.csv"])
            .expect("arguments should parse");
        let options = cli.load_options();

        assert_eq!(
            options.overrides.csv_path.as_deref(),
            Some(std::path::Path::new("/tmp/quotes.csv"))
        );
        assert!(!options.require_file);
    }

    #[test]
    fn unknown_demand_level_is_rejected_by_the_parser() {
        let parsed = Cli::try_parse_from([
            "procura", "evaluate", "--stock", "3", "--demand", "urgent", "--price", "1",
            "--average", "2",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn rust_log_overrides_the_configured_level() {
        assert_eq!(log_filter("warn", None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter("warn", Some("trace")).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(
            log_filter("warn", Some("procura_data=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn invalid_rust_log_falls_back_to_the_configured_level() {
        let filter = log_filter("error", Some("procura=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }
}
