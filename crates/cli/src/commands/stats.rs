use procura_core::config::LoadOptions;
use procura_core::errors::ApplicationError;
use procura_core::{MarketStatistics, SavingsOpportunity};
use procura_data::{ItemProcessor, ItemSummary};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{to_value, CommandContext, CommandResult};

const COMMAND: &str = "stats";

#[derive(Debug, Serialize)]
struct ItemStatistics {
    summary: ItemSummary,
    statistics: MarketStatistics,
    fair_price: Decimal,
    savings: SavingsOpportunity,
}

pub fn run(options: &LoadOptions, item: &str) -> CommandResult {
    let context = match CommandContext::load(COMMAND, options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let item_id = match context.require_item(COMMAND, item) {
        Ok(item_id) => item_id,
        Err(failure) => return failure,
    };

    let processor = ItemProcessor::new(&context.dataset);
    let Some(summary) = processor.summary(&item_id) else {
        return CommandResult::from_application(COMMAND, ApplicationError::NotFound(item_id.0));
    };

    let report = processor.price_statistics(&item_id).and_then(|statistics| {
        Ok(ItemStatistics {
            fair_price: processor.fair_price(&item_id)?,
            savings: processor.savings(&item_id)?,
            summary,
            statistics,
        })
    });
    let report = match report {
        Ok(report) => report,
        Err(error) => return CommandResult::from_application(COMMAND, error.into()),
    };

    tracing::info!(
        event_name = "system.cli.stats_computed",
        item_id = %item_id.0,
        suppliers = report.summary.supplier_count,
        "item statistics computed"
    );

    let message = format!(
        "{}: {} suppliers, average {}",
        report.summary.item_name, report.summary.supplier_count, report.summary.avg_price
    );
    match to_value(COMMAND, &report) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, data),
        Err(failure) => failure,
    }
}
