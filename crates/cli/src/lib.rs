pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tailor_core::config::{AnalyticsConfig, ConfigOverrides, LoadOptions, LogFormat};

use commands::forecast::{Mode, Target};

#[derive(Debug, Parser)]
#[command(
    name = "tailor",
    about = "Tailor retail analytics CLI",
    long_about = "Compute item similarity, bundle recommendations, sales forecasts, and segment reports from a transaction snapshot.",
    after_help = "Examples:\n  tailor summary\n  tailor similarity --item tunic --top 5\n  tailor forecast --item jeans --mode future --periods 12\n  tailor config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a tailor.toml configuration file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Transaction CSV to analyze (overrides input.path)")]
    input: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level for stderr diagnostics (overrides logging.level)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Headline sales metrics and ingestion counts")]
    Summary,
    #[command(about = "Item-item similarity matrix, or the items most similar to one item")]
    Similarity {
        #[arg(long)]
        item: Option<String>,
        #[arg(long, default_value_t = tailor_core::session::DEFAULT_SIMILAR_ITEMS)]
        top: usize,
    },
    #[command(about = "Bundle recommendations and explicitly skipped anchors")]
    Bundles {
        #[arg(long)]
        item: Option<String>,
    },
    #[command(about = "Backtest or project monthly sales for one item or every item")]
    Forecast {
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        item: Option<String>,
        #[arg(long)]
        all: bool,
        #[arg(long, value_enum, default_value_t = Mode::Backtest)]
        mode: Mode,
        #[arg(long, help = "Future horizon in months (defaults to forecast.default_horizon)")]
        periods: Option<usize>,
    },
    #[command(about = "Sales by item, payment method, and review band")]
    Segments {
        #[arg(long)]
        item: Option<String>,
    },
    #[command(about = "First-sale month, peak month, and lead time per item")]
    Timing,
    #[command(about = "Purchase history and review trend for one customer")]
    Customer {
        #[arg(long)]
        id: String,
    },
    #[command(about = "Monthly sales rows for selected items")]
    Trends {
        #[arg(long = "item", required = true, num_args = 1..)]
        items: Vec<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        overrides: ConfigOverrides { input_path: cli.input, log_level: cli.log_level },
    };

    if let Ok(config) = AnalyticsConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Summary => commands::summary::run(&options),
        Command::Similarity { item, top } => {
            commands::similarity::run(&options, item.as_deref(), top)
        }
        Command::Bundles { item } => commands::bundles::run(&options, item.as_deref()),
        Command::Forecast { item, all: _, mode, periods } => {
            let target = item.map_or(Target::All, Target::Item);
            commands::forecast::run(&options, &target, mode, periods)
        }
        Command::Segments { item } => commands::segments::run(&options, item.as_deref()),
        Command::Timing => commands::timing::run(&options),
        Command::Customer { id } => commands::customer::run(&options, &id),
        Command::Trends { items } => commands::trends::run(&options, &items),
        Command::Config => commands::config::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Diagnostics go to stderr; stdout carries only the JSON payload.
fn init_logging(config: &AnalyticsConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
