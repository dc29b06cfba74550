use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::recommendation::DEFAULT_NEGOTIATION_MARGIN;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data: DataConfig,
    pub rules: RulesConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DataConfig {
    pub csv_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub negotiation_margin: Decimal,
    pub preferred_price_threshold: Decimal,
}

#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    pub reliable_min_stock: u32,
    pub top_n: usize,
    pub anomaly_cv_threshold: Decimal,
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
    pub csv_path: Option<PathBuf>,
    pub negotiation_margin: Option<Decimal>,
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig { csv_path: PathBuf::from("data/sample_data.csv") },
            rules: RulesConfig {
                negotiation_margin: DEFAULT_NEGOTIATION_MARGIN,
                preferred_price_threshold: Decimal::new(10, 2),
            },
            analysis: AnalysisConfig {
                reliable_min_stock: 20,
                top_n: 3,
                anomaly_cv_threshold: Decimal::new(20, 2),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("procura.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(data) = patch.data {
            if let Some(csv_path) = data.csv_path {
                self.data.csv_path = csv_path;
            }
        }

        if let Some(rules) = patch.rules {
            if let Some(negotiation_margin) = rules.negotiation_margin {
                self.rules.negotiation_margin = negotiation_margin;
            }
            if let Some(preferred_price_threshold) = rules.preferred_price_threshold {
                self.rules.preferred_price_threshold = preferred_price_threshold;
            }
        }

        if let Some(analysis) = patch.analysis {
            if let Some(reliable_min_stock) = analysis.reliable_min_stock {
                self.analysis.reliable_min_stock = reliable_min_stock;
            }
            if let Some(top_n) = analysis.top_n {
                self.analysis.top_n = top_n;
            }
            if let Some(anomaly_cv_threshold) = analysis.anomaly_cv_threshold {
                self.analysis.anomaly_cv_threshold = anomaly_cv_threshold;
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
        if let Some(value) = read_env("PROCURA_DATA_CSV_PATH") {
            self.data.csv_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("PROCURA_RULES_NEGOTIATION_MARGIN") {
            self.rules.negotiation_margin =
                parse_env("PROCURA_RULES_NEGOTIATION_MARGIN", &value)?;
        }
        if let Some(value) = read_env("PROCURA_RULES_PREFERRED_PRICE_THRESHOLD") {
            self.rules.preferred_price_threshold =
                parse_env("PROCURA_RULES_PREFERRED_PRICE_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("PROCURA_ANALYSIS_RELIABLE_MIN_STOCK") {
            self.analysis.reliable_min_stock =
                parse_env("PROCURA_ANALYSIS_RELIABLE_MIN_STOCK", &value)?;
        }
        if let Some(value) = read_env("PROCURA_ANALYSIS_TOP_N") {
            self.analysis.top_n = parse_env("PROCURA_ANALYSIS_TOP_N", &value)?;
        }
        if let Some(value) = read_env("PROCURA_ANALYSIS_ANOMALY_CV_THRESHOLD") {
            self.analysis.anomaly_cv_threshold =
                parse_env("PROCURA_ANALYSIS_ANOMALY_CV_THRESHOLD", &value)?;
        }

        let log_level =
            read_env("PROCURA_LOGGING_LEVEL").or_else(|| read_env("PROCURA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PROCURA_LOGGING_FORMAT").or_else(|| read_env("PROCURA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(csv_path) = overrides.csv_path {
            self.data.csv_path = csv_path;
        }
        if let Some(negotiation_margin) = overrides.negotiation_margin {
            self.rules.negotiation_margin = negotiation_margin;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_data(&self.data)?;
        validate_rules(&self.rules)?;
        validate_analysis(&self.analysis)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("procura.toml"), PathBuf::from("config/procura.toml")]
        .into_iter()
        .find(|path| path.exists())
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

fn validate_data(data: &DataConfig) -> Result<(), ConfigError> {
    if data.csv_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("data.csv_path must not be empty".to_string()));
    }

    Ok(())
}

fn validate_rules(rules: &RulesConfig) -> Result<(), ConfigError> {
    if !is_open_fraction(rules.negotiation_margin) {
        return Err(ConfigError::Validation(
            "rules.negotiation_margin must lie strictly between 0 and 1".to_string(),
        ));
    }

    if !is_open_fraction(rules.preferred_price_threshold) {
        return Err(ConfigError::Validation(
            "rules.preferred_price_threshold must lie strictly between 0 and 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    if analysis.top_n == 0 {
        return Err(ConfigError::Validation(
            "analysis.top_n must be greater than zero".to_string(),
        ));
    }

    if analysis.anomaly_cv_threshold <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "analysis.anomaly_cv_threshold must be greater than zero".to_string(),
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

fn is_open_fraction(value: Decimal) -> bool {
    value > Decimal::ZERO && value < Decimal::ONE
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    data: Option<DataPatch>,
    rules: Option<RulesPatch>,
    analysis: Option<AnalysisPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    csv_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesPatch {
    negotiation_margin: Option<Decimal>,
    preferred_price_threshold: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    reliable_min_stock: Option<u32>,
    top_n: Option<usize>,
    anomaly_cv_threshold: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
