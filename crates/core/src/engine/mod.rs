pub mod aggregator;
pub mod analysis;
pub mod recommendation;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::decision::Recommendation;
use crate::domain::observation::{DemandLevel, PriceObservation};
use crate::errors::RulesError;

use self::{
    aggregator::{DeterministicPriceAggregator, MarketStatistics, PriceAggregator},
    recommendation::{
        is_supplier_preferred, RecommendationEngine, RecommendationInput,
        ThresholdRecommendationEngine,
    },
};

/// Rounds a currency amount to the cent, midpoints away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone, Debug)]
pub struct ProcurementInput<'a> {
    pub observations: &'a [PriceObservation],
    pub selected_supplier: &'a str,
    pub stock: i64,
    pub demand: DemandLevel,
    pub negotiation_margin: Decimal,
    pub preferred_threshold: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcurementReport {
    pub statistics: MarketStatistics,
    pub selected_supplier: String,
    pub selected_price: Decimal,
    pub selected_is_preferred: bool,
    pub best_supplier: String,
    pub best_price: Decimal,
    pub average_price: Decimal,
    pub suggested_price: Decimal,
    pub recommendation: Recommendation,
    pub reasoning: String,
}

pub trait ProcurementRuntime: Send + Sync {
    fn evaluate(&self, input: ProcurementInput<'_>) -> Result<ProcurementReport, RulesError>;
}

pub struct DeterministicProcurementRuntime<A, R> {
    aggregator: A,
    engine: R,
}

impl<A, R> DeterministicProcurementRuntime<A, R> {
    pub fn new(aggregator: A, engine: R) -> Self {
        Self { aggregator, engine }
    }
}

impl Default
    for DeterministicProcurementRuntime<DeterministicPriceAggregator, ThresholdRecommendationEngine>
{
    fn default() -> Self {
        Self::new(DeterministicPriceAggregator, ThresholdRecommendationEngine)
    }
}

impl<A, R> ProcurementRuntime for DeterministicProcurementRuntime<A, R>
where
    A: PriceAggregator,
    R: RecommendationEngine,
{
    fn evaluate(&self, input: ProcurementInput<'_>) -> Result<ProcurementReport, RulesError> {
        let statistics = self.aggregator.aggregate(input.observations)?;
        let selected = input
            .observations
            .iter()
            .find(|observation| observation.supplier_name == input.selected_supplier)
            .ok_or_else(|| RulesError::UnknownSupplier {
                supplier: input.selected_supplier.to_string(),
            })?;

        let average_price = round_currency(statistics.mean_price);
        let recommendation = self.engine.recommend(
            &RecommendationInput::new(input.stock, input.demand, selected.unit_price, average_price)
                .with_margin(input.negotiation_margin),
        )?;

        let reasoning = procurement_reasoning(
            input.stock,
            &recommendation,
            selected.unit_price,
            average_price,
            &statistics.cheapest_supplier_name,
        );

        Ok(ProcurementReport {
            selected_supplier: selected.supplier_name.clone(),
            selected_price: selected.unit_price,
            selected_is_preferred: is_supplier_preferred(
                selected.unit_price,
                average_price,
                input.preferred_threshold,
            ),
            best_supplier: statistics.cheapest_supplier_name.clone(),
            best_price: statistics.cheapest_price,
            average_price,
            suggested_price: recommendation.suggested_price,
            recommendation,
            reasoning,
            statistics,
        })
    }
}

fn procurement_reasoning(
    stock: i64,
    recommendation: &Recommendation,
    selected_price: Decimal,
    average_price: Decimal,
    best_supplier: &str,
) -> String {
    let mut parts = vec![
        format!(
            "Stock Level: {} ({stock} units) | Demand: {}",
            recommendation.tier, recommendation.demand
        ),
        format!("Supplier selected at {selected_price:.2} vs market average of {average_price:.2}"),
    ];

    let savings = average_price - selected_price;
    if savings > Decimal::ZERO {
        let savings_pct = (savings / average_price * Decimal::ONE_HUNDRED).round_dp(1);
        parts.push(format!("(Savings: {savings_pct:.1}% below average)"));
    }

    parts.push(format!("Best supplier available: {best_supplier}"));
    parts.push(recommendation.reason.template().to_string());
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::domain::decision::{Decision, ReasonCode, Recommendation, StockTier};
    use crate::domain::observation::{DemandLevel, PriceObservation, SupplierId};
    use crate::engine::{
        aggregator::DeterministicPriceAggregator,
        recommendation::{RecommendationEngine, RecommendationInput, DEFAULT_NEGOTIATION_MARGIN},
        round_currency, DeterministicProcurementRuntime, ProcurementInput, ProcurementRuntime,
    };
    use crate::errors::RulesError;

    fn observation(supplier: &str, cents: i64) -> PriceObservation {
        PriceObservation {
            supplier_id: SupplierId(format!("S-{supplier}")),
            supplier_name: supplier.to_string(),
            unit_price: Decimal::new(cents, 2),
            stock_level: 15,
            demand_level: DemandLevel::High,
            observed_at: NaiveDate::from_ymd_opt(2026, 2, 10).expect("valid date"),
        }
    }

    fn laptop_quotes() -> Vec<PriceObservation> {
        vec![
            observation("TechSource", 78_000),
            observation("OfficeHub", 85_000),
            observation("Prime", 92_000),
        ]
    }

    fn input<'a>(observations: &'a [PriceObservation], supplier: &'a str) -> ProcurementInput<'a> {
        ProcurementInput {
            observations,
            selected_supplier: supplier,
            stock: 15,
            demand: DemandLevel::High,
            negotiation_margin: DEFAULT_NEGOTIATION_MARGIN,
            preferred_threshold: Decimal::new(5, 2),
        }
    }

    #[test]
    fn runtime_combines_statistics_and_recommendation() {
        let quotes = laptop_quotes();
        let report = DeterministicProcurementRuntime::default()
            .evaluate(input(&quotes, "TechSource"))
            .expect("evaluate");

        assert_eq!(report.average_price, Decimal::new(85_000, 2));
        assert_eq!(report.suggested_price, Decimal::new(80_750, 2));
        assert_eq!(report.best_supplier, "TechSource");
        assert_eq!(report.recommendation.decision, Decision::BuyNow);
        assert!(report.selected_is_preferred);
        assert!(report
            .reasoning
            .contains("Supplier selected at 780.00 vs market average of 850.00"));
        assert!(report.reasoning.contains("(Savings: 8.2% below average)"));
        assert!(report.reasoning.contains("Best supplier available: TechSource"));
    }

    #[test]
    fn selected_supplier_above_average_reports_no_savings() {
        let quotes = laptop_quotes();
        let report = DeterministicProcurementRuntime::default()
            .evaluate(input(&quotes, "Prime"))
            .expect("evaluate");

        assert!(!report.selected_is_preferred);
        assert!(!report.reasoning.contains("Savings"));
        assert_eq!(report.selected_price, Decimal::new(92_000, 2));
    }

    #[test]
    fn average_price_is_rounded_before_the_decision() {
        let quotes =
            vec![observation("A", 1_000), observation("B", 1_000), observation("C", 1_001)];
        let report = DeterministicProcurementRuntime::default()
            .evaluate(input(&quotes, "A"))
            .expect("evaluate");

        assert_eq!(report.average_price, Decimal::new(1_000, 2));
        assert_eq!(round_currency(report.statistics.mean_price), report.average_price);
    }

    #[test]
    fn unknown_supplier_is_rejected() {
        let quotes = laptop_quotes();
        let error = DeterministicProcurementRuntime::default()
            .evaluate(input(&quotes, "Nobody"))
            .expect_err("unknown supplier should fail");

        assert_eq!(error, RulesError::UnknownSupplier { supplier: "Nobody".to_string() });
    }

    #[test]
    fn empty_observations_fail_before_supplier_lookup() {
        let error = DeterministicProcurementRuntime::default()
            .evaluate(input(&[], "TechSource"))
            .expect_err("empty input should fail");

        assert_eq!(error, RulesError::EmptyInput);
    }

    #[test]
    fn runtime_supports_explicit_engine_interfaces() {
        struct AlwaysWait;

        impl RecommendationEngine for AlwaysWait {
            fn recommend(&self, input: &RecommendationInput) -> Result<Recommendation, RulesError> {
                Ok(Recommendation {
                    decision: Decision::Wait,
                    suggested_price: input.average_price,
                    tier: StockTier::classify(input.stock),
                    demand: input.demand,
                    reason: ReasonCode::SufficientStock,
                    reasoning: String::new(),
                })
            }
        }

        let quotes = laptop_quotes();
        let runtime =
            DeterministicProcurementRuntime::new(DeterministicPriceAggregator, AlwaysWait);
        let report = runtime.evaluate(input(&quotes, "TechSource")).expect("evaluate");

        assert_eq!(report.recommendation.decision, Decision::Wait);
        assert_eq!(report.suggested_price, report.average_price);
    }
}
