use procura_core::config::LoadOptions;
use procura_data::ItemProcessor;

use crate::commands::{to_value, CommandContext, CommandResult};

const COMMAND: &str = "anomalies";

pub fn run(options: &LoadOptions) -> CommandResult {
    let context = match CommandContext::load(COMMAND, options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let threshold = context.config.analysis.anomaly_cv_threshold;
    let anomalies = match ItemProcessor::new(&context.dataset).anomalies(threshold) {
        Ok(anomalies) => anomalies,
        Err(error) => return CommandResult::from_application(COMMAND, error.into()),
    };

    for entry in &anomalies {
        tracing::info!(
            event_name = "system.cli.price_anomaly",
            item_id = %entry.item_id.0,
            variance_pct = %entry.anomaly.variance_pct,
            "supplier prices vary beyond threshold"
        );
    }

    let message = format!("{} items exceed cv threshold {threshold}", anomalies.len());
    match to_value(COMMAND, &anomalies) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, data),
        Err(failure) => failure,
    }
}
