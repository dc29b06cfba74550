use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::decision::{ReasonCode, Recommendation, StockTier};
use crate::domain::observation::DemandLevel;
use crate::engine::round_currency;
use crate::errors::RulesError;

/// 0.05
pub const DEFAULT_NEGOTIATION_MARGIN: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
/// High stock is only worth buying when the price is at least this far below average.
pub const DISCOUNTED_SURPLUS_THRESHOLD: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub stock: i64,
    pub demand: DemandLevel,
    pub candidate_price: Decimal,
    pub average_price: Decimal,
    pub negotiation_margin: Decimal,
}

impl RecommendationInput {
    pub fn new(
        stock: i64,
        demand: DemandLevel,
        candidate_price: Decimal,
        average_price: Decimal,
    ) -> Self {
        Self {
            stock,
            demand,
            candidate_price,
            average_price,
            negotiation_margin: DEFAULT_NEGOTIATION_MARGIN,
        }
    }

    pub fn with_margin(mut self, negotiation_margin: Decimal) -> Self {
        self.negotiation_margin = negotiation_margin;
        self
    }
}

pub trait RecommendationEngine: Send + Sync {
    fn recommend(&self, input: &RecommendationInput) -> Result<Recommendation, RulesError>;
}

#[derive(Default)]
pub struct ThresholdRecommendationEngine;

impl RecommendationEngine for ThresholdRecommendationEngine {
    fn recommend(&self, input: &RecommendationInput) -> Result<Recommendation, RulesError> {
        recommend(
            input.stock,
            input.demand,
            input.candidate_price,
            input.average_price,
            input.negotiation_margin,
        )
    }
}

pub fn recommend(
    stock: i64,
    demand: DemandLevel,
    candidate_price: Decimal,
    average_price: Decimal,
    negotiation_margin: Decimal,
) -> Result<Recommendation, RulesError> {
    if average_price <= Decimal::ZERO {
        return Err(RulesError::InvalidPrice { field: "average_price", value: average_price });
    }
    if candidate_price <= Decimal::ZERO {
        return Err(RulesError::InvalidPrice { field: "candidate_price", value: candidate_price });
    }
    if stock < 0 {
        return Err(RulesError::InvalidStock { value: stock });
    }
    validate_margin(negotiation_margin)?;

    let tier = StockTier::classify(stock);
    let reason = decide(tier, demand, candidate_price, average_price);

    Ok(Recommendation {
        decision: reason.decision(),
        suggested_price: negotiation_price(average_price, negotiation_margin),
        tier,
        demand,
        reason,
        reasoning: format!(
            "Stock Level: {tier} ({stock} units) | Demand: {demand} | {}",
            reason.template()
        ),
    })
}

/// Evaluates the decision table top-down; the first matching row wins.
pub fn decide(
    tier: StockTier,
    demand: DemandLevel,
    candidate_price: Decimal,
    average_price: Decimal,
) -> ReasonCode {
    match (tier, demand) {
        (StockTier::Low, DemandLevel::High) => ReasonCode::UrgentRestock,
        (StockTier::Medium, DemandLevel::High) => ReasonCode::ModerateStockHighDemand,
        (StockTier::High, DemandLevel::High)
            if candidate_price <= average_price * (Decimal::ONE - DISCOUNTED_SURPLUS_THRESHOLD) =>
        {
            ReasonCode::DiscountedSurplus
        }
        _ => ReasonCode::SufficientStock,
    }
}

/// Target purchase price: the market average less the negotiation margin, to the cent.
pub fn negotiation_price(average_price: Decimal, negotiation_margin: Decimal) -> Decimal {
    round_currency(average_price * (Decimal::ONE - negotiation_margin))
}

/// A supplier is preferred when its price sits strictly below `average * (1 - threshold)`.
pub fn is_supplier_preferred(
    supplier_price: Decimal,
    average_price: Decimal,
    threshold: Decimal,
) -> bool {
    supplier_price < average_price * (Decimal::ONE - threshold)
}

pub fn validate_margin(negotiation_margin: Decimal) -> Result<(), RulesError> {
    if negotiation_margin <= Decimal::ZERO || negotiation_margin >= Decimal::ONE {
        return Err(RulesError::InvalidMargin { value: negotiation_margin });
    }
    Ok(())
}
