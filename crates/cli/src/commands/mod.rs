pub mod bundles;
pub mod config;
pub mod customer;
pub mod forecast;
pub mod segments;
pub mod similarity;
pub mod summary;
pub mod timing;
pub mod trends;

use serde::Serialize;
use serde_json::Value;
use tailor_core::config::{AnalyticsConfig, LoadOptions};
use tailor_core::{AnalyticsError, AnalyticsSession, IngestReport, TransactionStore};

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
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Successful command body. `data` is `null` when a lookup found nothing.
#[derive(Debug)]
pub struct Reply {
    data: Value,
    message: Option<String>,
}

impl Reply {
    pub fn data(data: impl Serialize) -> anyhow::Result<Self> {
        Ok(Self { data: serde_json::to_value(data)?, message: None })
    }

    pub fn miss(message: impl Into<String>) -> Self {
        Self { data: Value::Null, message: Some(message.into()) }
    }
}

impl CommandResult {
    pub fn success(command: &str, reply: Reply) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: reply.message,
            data: Some(reply.data),
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
            message: Some(message.into()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_outcome(command: &str, outcome: anyhow::Result<Reply>) -> Self {
        match outcome {
            Ok(reply) => Self::success(command, reply),
            Err(error) => match error.downcast_ref::<AnalyticsError>() {
                Some(analytics) => Self::failure(
                    command,
                    analytics.error_class(),
                    format!("{} {analytics}", analytics.user_message()),
                    analytics.exit_code(),
                ),
                None => Self::failure(command, "internal", format!("{error:#}"), 1),
            },
        }
    }
}

/// Load config, ingest the configured snapshot, and build a session over it.
pub fn load_session(options: &LoadOptions) -> Result<(AnalyticsSession, IngestReport), AnalyticsError> {
    let config = AnalyticsConfig::load(options.clone())?;
    let (table, report) = TransactionStore::load_csv(&config.input.path, &config.catalog())?;
    Ok((AnalyticsSession::new(table, config), report))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
