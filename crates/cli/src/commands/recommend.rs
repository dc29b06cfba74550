use procura_core::config::LoadOptions;
use procura_core::errors::RulesError;
use procura_core::{
    DemandLevel, DeterministicProcurementRuntime, ProcurementInput, ProcurementRuntime,
};
use rust_decimal::Decimal;

use crate::commands::{to_value, CommandContext, CommandResult};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Default)]
pub struct RecommendArgs {
    pub item: String,
    pub supplier: String,
    pub stock: Option<i64>,
    pub demand: Option<DemandLevel>,
    pub margin: Option<Decimal>,
}

/// Stock and demand default to the selected supplier's row.
pub fn run(options: &LoadOptions, args: &RecommendArgs) -> CommandResult {
    let context = match CommandContext::load(COMMAND, options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let item_id = match context.require_item(COMMAND, &args.item) {
        Ok(item_id) => item_id,
        Err(failure) => return failure,
    };

    let observations = context.dataset.observations(&item_id);
    let supplier = args.supplier.trim();
    let Some(selected) =
        observations.iter().find(|observation| observation.supplier_name == supplier)
    else {
        let error = RulesError::UnknownSupplier { supplier: supplier.to_string() };
        return CommandResult::from_application(COMMAND, error.into());
    };

    let input = ProcurementInput {
        observations: &observations,
        selected_supplier: supplier,
        stock: args.stock.unwrap_or(i64::from(selected.stock_level)),
        demand: args.demand.unwrap_or(selected.demand_level),
        negotiation_margin: args.margin.unwrap_or(context.config.rules.negotiation_margin),
        preferred_threshold: context.config.rules.preferred_price_threshold,
    };

    let report = match DeterministicProcurementRuntime::default().evaluate(input) {
        Ok(report) => report,
        Err(error) => return CommandResult::from_application(COMMAND, error.into()),
    };

    tracing::info!(
        event_name = "system.cli.recommendation_issued",
        item_id = %item_id.0,
        supplier = %report.selected_supplier,
        decision = %report.recommendation.decision,
        "procurement recommendation issued"
    );

    let message = format!(
        "{} from {}: {}",
        context.dataset.item_name(&item_id).unwrap_or_default(),
        report.selected_supplier,
        report.recommendation.decision
    );
    match to_value(COMMAND, &report) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, data),
        Err(failure) => failure,
    }
}
