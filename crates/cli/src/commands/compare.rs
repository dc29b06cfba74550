use procura_core::config::LoadOptions;
use procura_core::PriceObservation;
use procura_data::{ComparisonRow, ItemProcessor};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{to_value, CommandContext, CommandResult};

const COMMAND: &str = "compare";

#[derive(Debug, Serialize)]
struct SupplierComparison {
    item_name: String,
    suppliers: Vec<ComparisonRow>,
    reliable_min_stock: u32,
    reliable_suppliers: Vec<String>,
    best_value_suppliers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    within_budget: Option<Vec<String>>,
}

pub fn run(options: &LoadOptions, item: &str, max_price: Option<Decimal>) -> CommandResult {
    let context = match CommandContext::load(COMMAND, options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let item_id = match context.require_item(COMMAND, item) {
        Ok(item_id) => item_id,
        Err(failure) => return failure,
    };

    let processor = ItemProcessor::new(&context.dataset);
    let analysis = &context.config.analysis;
    let reliable = processor.reliable_suppliers(&item_id, analysis.reliable_min_stock);
    let comparison = SupplierComparison {
        item_name: context.dataset.item_name(&item_id).unwrap_or_default().to_string(),
        suppliers: processor.comparison_table(&item_id),
        reliable_min_stock: analysis.reliable_min_stock,
        reliable_suppliers: names(reliable),
        best_value_suppliers: names(processor.best_value_suppliers(&item_id, analysis.top_n)),
        within_budget: max_price
            .map(|max_price| names(processor.suppliers_within_price(&item_id, max_price))),
    };

    let message =
        format!("{}: {} supplier quotes", comparison.item_name, comparison.suppliers.len());
    match to_value(COMMAND, &comparison) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, data),
        Err(failure) => failure,
    }
}

fn names(observations: Vec<PriceObservation>) -> Vec<String> {
    observations.into_iter().map(|observation| observation.supplier_name).collect()
}
