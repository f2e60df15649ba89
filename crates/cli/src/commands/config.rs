use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tailor_core::config::{AnalyticsConfig, LoadOptions, DEFAULT_CONFIG_FILES};
use tailor_core::AnalyticsError;
use toml::Value;

use super::{CommandResult, Reply};

pub const NAME: &str = "config";

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct EffectiveConfig {
    precedence: &'static str,
    entries: Vec<ConfigEntry>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    CommandResult::from_outcome(NAME, execute(options))
}

fn execute(options: &LoadOptions) -> anyhow::Result<Reply> {
    let config = AnalyticsConfig::load(options.clone()).map_err(AnalyticsError::from)?;

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let sources = Sources {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path,
    };

    let input_source = if options.overrides.input_path.is_some() {
        "cli (--input)".to_string()
    } else {
        sources.field("input.path", &["TAILOR_INPUT_PATH"])
    };
    let level_source = if options.overrides.log_level.is_some() {
        "cli (--log-level)".to_string()
    } else {
        sources.field("logging.level", &["TAILOR_LOGGING_LEVEL", "TAILOR_LOG_LEVEL"])
    };

    let similarity = &config.similarity;
    let bundles = &config.bundles;
    let forecast = &config.forecast;

    let entries = vec![
        entry("input.path", config.input.path.display().to_string(), input_source),
        entry(
            "input.items",
            format!("{} items", config.input.items.len()),
            sources.field("input.items", &[]),
        ),
        entry(
            "similarity.min_shared_raters",
            similarity.min_shared_raters.to_string(),
            sources.field("similarity.min_shared_raters", &["TAILOR_SIMILARITY_MIN_SHARED_RATERS"]),
        ),
        entry(
            "bundles.co_purchase_weight",
            bundles.co_purchase_weight.to_string(),
            sources.field("bundles.co_purchase_weight", &["TAILOR_BUNDLES_CO_PURCHASE_WEIGHT"]),
        ),
        entry(
            "bundles.similarity_weight",
            bundles.similarity_weight.to_string(),
            sources.field("bundles.similarity_weight", &["TAILOR_BUNDLES_SIMILARITY_WEIGHT"]),
        ),
        entry(
            "bundles.max_per_item",
            bundles.max_per_item.to_string(),
            sources.field("bundles.max_per_item", &["TAILOR_BUNDLES_MAX_PER_ITEM"]),
        ),
        entry(
            "forecast.min_backtest_months",
            forecast.min_backtest_months.to_string(),
            sources.field("forecast.min_backtest_months", &["TAILOR_FORECAST_MIN_BACKTEST_MONTHS"]),
        ),
        entry(
            "forecast.train_fraction",
            forecast.train_fraction.to_string(),
            sources.field("forecast.train_fraction", &["TAILOR_FORECAST_TRAIN_FRACTION"]),
        ),
        entry(
            "forecast.confidence_level",
            forecast.confidence_level.to_string(),
            sources.field("forecast.confidence_level", &["TAILOR_FORECAST_CONFIDENCE_LEVEL"]),
        ),
        entry(
            "forecast.default_horizon",
            forecast.default_horizon.to_string(),
            sources.field("forecast.default_horizon", &["TAILOR_FORECAST_DEFAULT_HORIZON"]),
        ),
        entry(
            "forecast.min_horizon",
            forecast.min_horizon.to_string(),
            sources.field("forecast.min_horizon", &[]),
        ),
        entry(
            "forecast.max_horizon",
            forecast.max_horizon.to_string(),
            sources.field("forecast.max_horizon", &[]),
        ),
        entry(
            "forecast.fit_timeout_ms",
            forecast.fit_timeout_ms.to_string(),
            sources.field("forecast.fit_timeout_ms", &["TAILOR_FORECAST_FIT_TIMEOUT_MS"]),
        ),
        entry(
            "forecast.max_iterations",
            forecast.max_iterations.to_string(),
            sources.field("forecast.max_iterations", &["TAILOR_FORECAST_MAX_ITERATIONS"]),
        ),
        entry("logging.level", config.logging.level.clone(), level_source),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            sources.field("logging.format", &["TAILOR_LOGGING_FORMAT", "TAILOR_LOG_FORMAT"]),
        ),
    ];

    Reply::data(EffectiveConfig { precedence: "cli > env > file > default", entries })
}

struct Sources {
    doc: Option<Value>,
    path: Option<PathBuf>,
}

impl Sources {
    fn field(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn entry(key: &'static str, value: String, source: String) -> ConfigEntry {
    ConfigEntry { key, value, source }
}
