use procura_core::config::LoadOptions;
use procura_core::errors::ApplicationError;
use procura_core::{recommend, DemandLevel};
use rust_decimal::Decimal;

use crate::commands::{load_config, to_value, CommandResult};

const COMMAND: &str = "evaluate";

#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    pub stock: i64,
    pub demand: DemandLevel,
    pub price: Decimal,
    pub average: Decimal,
    pub margin: Option<Decimal>,
}

/// Applies the decision rules to explicit inputs without touching the dataset.
pub fn run(options: &LoadOptions, args: &EvaluateArgs) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let margin = args.margin.unwrap_or(config.rules.negotiation_margin);
    let recommendation = match recommend(args.stock, args.demand, args.price, args.average, margin)
    {
        Ok(recommendation) => recommendation,
        Err(error) => {
            return CommandResult::from_application(COMMAND, ApplicationError::Rules(error))
        }
    };

    let message = format!(
        "{} (suggested price {})",
        recommendation.decision, recommendation.suggested_price
    );
    match to_value(COMMAND, &recommendation) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, data),
        Err(failure) => failure,
    }
}
