use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::item::{ItemCatalog, DEFAULT_ITEM_VOCABULARY};

#[derive(Clone, Debug)]
pub struct AnalyticsConfig {
    pub input: InputConfig,
    pub similarity: SimilarityConfig,
    pub bundles: BundleConfig,
    pub forecast: ForecastConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct InputConfig {
    pub path: PathBuf,
    pub items: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityConfig {
    pub min_shared_raters: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BundleConfig {
    pub co_purchase_weight: f64,
    pub similarity_weight: f64,
    pub max_per_item: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForecastConfig {
    pub min_backtest_months: usize,
    pub train_fraction: f64,
    pub confidence_level: f64,
    pub default_horizon: usize,
    pub min_horizon: usize,
    pub max_horizon: usize,
    pub fit_timeout_ms: u64,
    pub max_iterations: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub input_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["tailor.toml", "config/tailor.toml"];

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            input: InputConfig {
                path: PathBuf::from("retail_sales.csv"),
                items: DEFAULT_ITEM_VOCABULARY.iter().map(|item| item.to_string()).collect(),
            },
            similarity: SimilarityConfig::default(),
            bundles: BundleConfig::default(),
            forecast: ForecastConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self { min_shared_raters: 2 }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self { co_purchase_weight: 0.5, similarity_weight: 0.5, max_per_item: 3 }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_backtest_months: 12,
            train_fraction: 0.8,
            confidence_level: 0.95,
            default_horizon: 6,
            min_horizon: 3,
            max_horizon: 24,
            fit_timeout_ms: 2_000,
            max_iterations: 5_000,
        }
    }
}

impl ForecastConfig {
    pub fn fit_timeout(&self) -> Duration {
        Duration::from_millis(self.fit_timeout_ms)
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AnalyticsConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn catalog(&self) -> ItemCatalog {
        ItemCatalog::new(&self.input.items)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(input) = patch.input {
            if let Some(path) = input.path {
                self.input.path = path;
            }
            if let Some(items) = input.items {
                self.input.items = items;
            }
        }

        if let Some(similarity) = patch.similarity {
            if let Some(min_shared_raters) = similarity.min_shared_raters {
                self.similarity.min_shared_raters = min_shared_raters;
            }
        }

        if let Some(bundles) = patch.bundles {
            if let Some(co_purchase_weight) = bundles.co_purchase_weight {
                self.bundles.co_purchase_weight = co_purchase_weight;
            }
            if let Some(similarity_weight) = bundles.similarity_weight {
                self.bundles.similarity_weight = similarity_weight;
            }
            if let Some(max_per_item) = bundles.max_per_item {
                self.bundles.max_per_item = max_per_item;
            }
        }

        if let Some(forecast) = patch.forecast {
            if let Some(min_backtest_months) = forecast.min_backtest_months {
                self.forecast.min_backtest_months = min_backtest_months;
            }
            if let Some(train_fraction) = forecast.train_fraction {
                self.forecast.train_fraction = train_fraction;
            }
            if let Some(confidence_level) = forecast.confidence_level {
                self.forecast.confidence_level = confidence_level;
            }
            if let Some(default_horizon) = forecast.default_horizon {
                self.forecast.default_horizon = default_horizon;
            }
            if let Some(min_horizon) = forecast.min_horizon {
                self.forecast.min_horizon = min_horizon;
            }
            if let Some(max_horizon) = forecast.max_horizon {
                self.forecast.max_horizon = max_horizon;
            }
            if let Some(fit_timeout_ms) = forecast.fit_timeout_ms {
                self.forecast.fit_timeout_ms = fit_timeout_ms;
            }
            if let Some(max_iterations) = forecast.max_iterations {
                self.forecast.max_iterations = max_iterations;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TAILOR_INPUT_PATH") {
            self.input.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("TAILOR_SIMILARITY_MIN_SHARED_RATERS") {
            self.similarity.min_shared_raters =
                parse_usize("TAILOR_SIMILARITY_MIN_SHARED_RATERS", &value)?;
        }

        if let Some(value) = read_env("TAILOR_BUNDLES_CO_PURCHASE_WEIGHT") {
            self.bundles.co_purchase_weight =
                parse_f64("TAILOR_BUNDLES_CO_PURCHASE_WEIGHT", &value)?;
        }
        if let Some(value) = read_env("TAILOR_BUNDLES_SIMILARITY_WEIGHT") {
            self.bundles.similarity_weight = parse_f64("TAILOR_BUNDLES_SIMILARITY_WEIGHT", &value)?;
        }
        if let Some(value) = read_env("TAILOR_BUNDLES_MAX_PER_ITEM") {
            self.bundles.max_per_item = parse_usize("TAILOR_BUNDLES_MAX_PER_ITEM", &value)?;
        }

        if let Some(value) = read_env("TAILOR_FORECAST_MIN_BACKTEST_MONTHS") {
            self.forecast.min_backtest_months =
                parse_usize("TAILOR_FORECAST_MIN_BACKTEST_MONTHS", &value)?;
        }
        if let Some(value) = read_env("TAILOR_FORECAST_TRAIN_FRACTION") {
            self.forecast.train_fraction = parse_f64("TAILOR_FORECAST_TRAIN_FRACTION", &value)?;
        }
        if let Some(value) = read_env("TAILOR_FORECAST_CONFIDENCE_LEVEL") {
            self.forecast.confidence_level =
                parse_f64("TAILOR_FORECAST_CONFIDENCE_LEVEL", &value)?;
        }
        if let Some(value) = read_env("TAILOR_FORECAST_DEFAULT_HORIZON") {
            self.forecast.default_horizon = parse_usize("TAILOR_FORECAST_DEFAULT_HORIZON", &value)?;
        }
        if let Some(value) = read_env("TAILOR_FORECAST_FIT_TIMEOUT_MS") {
            self.forecast.fit_timeout_ms = parse_u64("TAILOR_FORECAST_FIT_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("TAILOR_FORECAST_MAX_ITERATIONS") {
            self.forecast.max_iterations = parse_usize("TAILOR_FORECAST_MAX_ITERATIONS", &value)?;
        }

        let log_level = read_env("TAILOR_LOGGING_LEVEL").or_else(|| read_env("TAILOR_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TAILOR_LOGGING_FORMAT").or_else(|| read_env("TAILOR_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(input_path) = overrides.input_path {
            self.input.path = input_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_input(&self.input)?;
        validate_similarity(&self.similarity)?;
        validate_bundles(&self.bundles)?;
        validate_forecast(&self.forecast)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_input(input: &InputConfig) -> Result<(), ConfigError> {
    if input.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("input.path must not be empty".to_string()));
    }

    if input.items.iter().all(|item| item.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "input.items must list at least one item name".to_string(),
        ));
    }

    Ok(())
}

fn validate_similarity(similarity: &SimilarityConfig) -> Result<(), ConfigError> {
    if similarity.min_shared_raters < 2 {
        return Err(ConfigError::Validation(
            "similarity.min_shared_raters must be at least 2".to_string(),
        ));
    }

    Ok(())
}

fn validate_bundles(bundles: &BundleConfig) -> Result<(), ConfigError> {
    let weights = [bundles.co_purchase_weight, bundles.similarity_weight];
    if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
        return Err(ConfigError::Validation(
            "bundles.co_purchase_weight and bundles.similarity_weight must be non-negative"
                .to_string(),
        ));
    }

    if (bundles.co_purchase_weight + bundles.similarity_weight - 1.0).abs() > 1e-9 {
        return Err(ConfigError::Validation(
            "bundles.co_purchase_weight and bundles.similarity_weight must sum to 1.0".to_string(),
        ));
    }

    if !(1..=3).contains(&bundles.max_per_item) {
        return Err(ConfigError::Validation(
            "bundles.max_per_item must be in range 1..=3".to_string(),
        ));
    }

    Ok(())
}

fn validate_forecast(forecast: &ForecastConfig) -> Result<(), ConfigError> {
    if !(forecast.train_fraction > 0.0 && forecast.train_fraction < 1.0) {
        return Err(ConfigError::Validation(
            "forecast.train_fraction must be strictly between 0 and 1".to_string(),
        ));
    }

    if !(0.80..=0.99).contains(&forecast.confidence_level) {
        return Err(ConfigError::Validation(
            "forecast.confidence_level must be in range 0.80..=0.99".to_string(),
        ));
    }

    if forecast.min_horizon == 0 {
        return Err(ConfigError::Validation(
            "forecast.min_horizon must be greater than zero".to_string(),
        ));
    }

    let ordered = forecast.min_horizon <= forecast.default_horizon
        && forecast.default_horizon <= forecast.max_horizon;
    if !ordered {
        return Err(ConfigError::Validation(
            "forecast.default_horizon must lie within forecast.min_horizon..=forecast.max_horizon"
                .to_string(),
        ));
    }

    if forecast.min_backtest_months < 2 {
        return Err(ConfigError::Validation(
            "forecast.min_backtest_months must be at least 2".to_string(),
        ));
    }

    if forecast.fit_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "forecast.fit_timeout_ms must be greater than zero".to_string(),
        ));
    }

    if forecast.max_iterations == 0 {
        return Err(ConfigError::Validation(
            "forecast.max_iterations must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    input: Option<InputPatch>,
    similarity: Option<SimilarityPatch>,
    bundles: Option<BundlesPatch>,
    forecast: Option<ForecastPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct InputPatch {
    path: Option<PathBuf>,
    items: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarityPatch {
    min_shared_raters: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct BundlesPatch {
    co_purchase_weight: Option<f64>,
    similarity_weight: Option<f64>,
    max_per_item: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastPatch {
    min_backtest_months: Option<usize>,
    train_fraction: Option<f64>,
    confidence_level: Option<f64>,
    default_horizon: Option<usize>,
    min_horizon: Option<usize>,
    max_horizon: Option<usize>,
    fit_timeout_ms: Option<u64>,
    max_iterations: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AnalyticsConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn load_from(dir: &TempDir, contents: &str) -> Result<AnalyticsConfig, String> {
        let path = dir.path().join("tailor.toml");
        fs::write(&path, contents).map_err(|err| err.to_string())?;
        AnalyticsConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            .map_err(|err| format!("config load failed: {err}"))
    }

    #[test]
    fn defaults_match_reference_parameters() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AnalyticsConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.bundles.co_purchase_weight == 0.5, "co-purchase weight defaults to 0.5")?;
        ensure(config.bundles.similarity_weight == 0.5, "similarity weight defaults to 0.5")?;
        ensure(config.bundles.max_per_item == 3, "three bundles per item by default")?;
        ensure(config.forecast.min_backtest_months == 12, "backtest needs a year of history")?;
        ensure(config.forecast.default_horizon == 6, "default horizon is six months")?;
        ensure(config.catalog().len() == 31, "default vocabulary has 31 items")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_TAILOR_DATA_DIR", "/srv/retail");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let config = load_from(
                &dir,
                r#"
[input]
path = "${TEST_TAILOR_DATA_DIR}/sales.csv"
"#,
            )?;

            ensure(
                config.input.path == PathBuf::from("/srv/retail/sales.csv"),
                "input path should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_TAILOR_DATA_DIR"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_an_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_TAILOR_UNSET_VAR"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("tailor.toml");
        fs::write(&path, "[input]\npath = \"${TEST_TAILOR_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let error = AnalyticsConfig::load(LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        });
        ensure(
            matches!(
                error,
                Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "TEST_TAILOR_UNSET_VAR"
            ),
            "unset interpolation variable should be reported by name",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TAILOR_LOG_LEVEL", "warn");
        env::set_var("TAILOR_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AnalyticsConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["TAILOR_LOG_LEVEL", "TAILOR_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TAILOR_INPUT_PATH", "from-env.csv");
        env::set_var("TAILOR_FORECAST_DEFAULT_HORIZON", "12");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tailor.toml");
            fs::write(
                &path,
                r#"
[input]
path = "from-file.csv"

[forecast]
default_horizon = 9
max_iterations = 800

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AnalyticsConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    input_path: Some(PathBuf::from("from-override.csv")),
                    log_level: Some("debug".to_string()),
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.input.path == PathBuf::from("from-override.csv"),
                "override input path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.forecast.default_horizon == 12, "env horizon should win over file")?;
            ensure(config.forecast.max_iterations == 800, "file value should win over default")
        })();

        clear_vars(&["TAILOR_INPUT_PATH", "TAILOR_FORECAST_DEFAULT_HORIZON"]);
        result
    }

    #[test]
    fn unparseable_env_override_names_key_and_value() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TAILOR_BUNDLES_MAX_PER_ITEM", "three");

        let result = (|| -> Result<(), String> {
            let error = AnalyticsConfig::load(LoadOptions::default());
            ensure(
                matches!(
                    error,
                    Err(ConfigError::InvalidEnvOverride { ref key, ref value })
                        if key == "TAILOR_BUNDLES_MAX_PER_ITEM" && value == "three"
                ),
                "invalid override should carry key and value",
            )
        })();

        clear_vars(&["TAILOR_BUNDLES_MAX_PER_ITEM"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TAILOR_BUNDLES_CO_PURCHASE_WEIGHT", "0.7");

        let result = (|| -> Result<(), String> {
            let error = match AnalyticsConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("sum to 1.0")
            );
            ensure(has_message, "validation failure should mention the weight sum")
        })();

        clear_vars(&["TAILOR_BUNDLES_CO_PURCHASE_WEIGHT"]);
        result
    }

    #[test]
    fn horizon_bounds_are_validated() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("tailor.toml");
        fs::write(&path, "[forecast]\ndefault_horizon = 30\n").map_err(|err| err.to_string())?;

        let error =
            AnalyticsConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(
                error,
                Err(ConfigError::Validation(ref message)) if message.contains("forecast.default_horizon")
            ),
            "out-of-range default horizon should be rejected",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let error = AnalyticsConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(error, Err(ConfigError::MissingConfigFile(ref path)) if *path == missing),
            "missing required file should be reported",
        )
    }
}
