pub mod anomalies;
pub mod compare;
pub mod config;
pub mod doctor;
pub mod evaluate;
pub mod items;
pub mod recommend;
pub mod stats;

use procura_core::config::{AppConfig, LoadOptions};
use procura_core::errors::{ApplicationError, InterfaceError};
use procura_data::{ItemId, ProcurementDataset};
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_DATA_UNAVAILABLE: u8 = 3;
pub const EXIT_BAD_REQUEST: u8 = 4;
pub const EXIT_NOT_FOUND: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            correlation_id: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            correlation_id: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Renders an application failure with a fresh correlation id.
    pub fn from_application(command: &str, error: ApplicationError) -> Self {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let error = error.into_interface(correlation_id);
        tracing::warn!(
            event_name = "system.cli.command_failed",
            command,
            error_class = error.error_class(),
            correlation_id = error.correlation_id(),
            "{}",
            error.message()
        );

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error.error_class().to_string()),
            correlation_id: Some(error.correlation_id().to_string()),
            message: format!("{} ({})", error.user_message(), error.message()),
            data: None,
        };
        Self { exit_code: exit_code_for(&error), output: serialize_payload(payload) }
    }
}

fn exit_code_for(error: &InterfaceError) -> u8 {
    match error {
        InterfaceError::BadRequest { .. } => EXIT_BAD_REQUEST,
        InterfaceError::NotFound { .. } => EXIT_NOT_FOUND,
        InterfaceError::DataUnavailable { .. } => EXIT_DATA_UNAVAILABLE,
        InterfaceError::Internal { .. } => 1,
    }
}

/// Loaded configuration and dataset shared by the data-backed commands.
#[derive(Debug)]
pub struct CommandContext {
    pub config: AppConfig,
    pub dataset: ProcurementDataset,
}

impl CommandContext {
    pub fn load(command: &str, options: &LoadOptions) -> Result<Self, CommandResult> {
        let config = load_config(command, options)?;
        let dataset = ProcurementDataset::load(&config.data.csv_path).map_err(|error| {
            CommandResult::from_application(command, ApplicationError::Data(error.to_string()))
        })?;
        Ok(Self { config, dataset })
    }

    pub fn require_item(&self, command: &str, item: &str) -> Result<ItemId, CommandResult> {
        let item_id = ItemId(item.trim().to_string());
        if self.dataset.contains(&item_id) {
            Ok(item_id)
        } else {
            Err(CommandResult::from_application(
                command,
                ApplicationError::NotFound(item.to_string()),
            ))
        }
    }
}

pub fn load_config(command: &str, options: &LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn to_value<T: Serialize>(command: &str, value: &T) -> Result<Value, CommandResult> {
    serde_json::to_value(value).map_err(|error| {
        CommandResult::failure(command, "serialization", error.to_string(), 1)
    })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string_pretty(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
