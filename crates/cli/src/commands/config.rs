use std::env;
use std::fs;
use std::path::Path;

use procura_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "config";

struct ConfigField {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
    overridden: bool,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec![
        "effective config (source precedence: flag > env > file > default):".to_string(),
    ];
    for field in fields(&config, options) {
        let source = if field.overridden {
            "flag".to_string()
        } else {
            field_source(&field, config_file_doc.as_ref(), config_file_path.as_deref())
        };
        lines.push(format!("- {} = {} (source: {source})", field.key_path, field.value));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn fields(config: &AppConfig, options: &LoadOptions) -> Vec<ConfigField> {
    let overrides = &options.overrides;
    vec![
        ConfigField {
            key_path: "data.csv_path",
            env_keys: &["PROCURA_DATA_CSV_PATH"],
            value: config.data.csv_path.display().to_string(),
            overridden: overrides.csv_path.is_some(),
        },
        ConfigField {
            key_path: "rules.negotiation_margin",
            env_keys: &["PROCURA_RULES_NEGOTIATION_MARGIN"],
            value: config.rules.negotiation_margin.to_string(),
            overridden: overrides.negotiation_margin.is_some(),
        },
        ConfigField {
            key_path: "rules.preferred_price_threshold",
            env_keys: &["PROCURA_RULES_PREFERRED_PRICE_THRESHOLD"],
            value: config.rules.preferred_price_threshold.to_string(),
            overridden: false,
        },
        ConfigField {
            key_path: "analysis.reliable_min_stock",
            env_keys: &["PROCURA_ANALYSIS_RELIABLE_MIN_STOCK"],
            value: config.analysis.reliable_min_stock.to_string(),
            overridden: false,
        },
        ConfigField {
            key_path: "analysis.top_n",
            env_keys: &["PROCURA_ANALYSIS_TOP_N"],
            value: config.analysis.top_n.to_string(),
            overridden: false,
        },
        ConfigField {
            key_path: "analysis.anomaly_cv_threshold",
            env_keys: &["PROCURA_ANALYSIS_ANOMALY_CV_THRESHOLD"],
            value: config.analysis.anomaly_cv_threshold.to_string(),
            overridden: false,
        },
        ConfigField {
            key_path: "logging.level",
            env_keys: &["PROCURA_LOGGING_LEVEL", "PROCURA_LOG_LEVEL"],
            value: config.logging.level.clone(),
            overridden: overrides.log_level.is_some(),
        },
        ConfigField {
            key_path: "logging.format",
            env_keys: &["PROCURA_LOGGING_FORMAT", "PROCURA_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
            overridden: false,
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &ConfigField,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
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
