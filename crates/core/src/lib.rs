pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;

pub use domain::decision::{Decision, ReasonCode, Recommendation, StockTier};
pub use domain::observation::{DemandLevel, PriceObservation, SupplierId};
pub use engine::aggregator::{
    aggregate, aggregate_prices, DeterministicPriceAggregator, MarketStatistics, PriceAggregator,
};
pub use engine::analysis::{
    fair_price, price_anomaly, savings_opportunity, PriceAnomaly, SavingsOpportunity,
};
pub use engine::recommendation::{
    decide, is_supplier_preferred, negotiation_price, recommend, RecommendationEngine,
    RecommendationInput, ThresholdRecommendationEngine, DEFAULT_NEGOTIATION_MARGIN,
};
pub use engine::{
    round_currency, DeterministicProcurementRuntime, ProcurementInput, ProcurementReport,
    ProcurementRuntime,
};
pub use errors::{ApplicationError, InterfaceError, RulesError};
