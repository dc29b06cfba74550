use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::observation::PriceObservation;
use crate::engine::aggregator::{aggregate, median_of_sorted};
use crate::engine::round_currency;
use crate::errors::RulesError;

const QUARTILE_FENCE: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsOpportunity {
    pub savings_per_unit: Decimal,
    pub savings_pct: Decimal,
    pub current_supplier: String,
    pub current_price: Decimal,
    pub best_supplier: String,
    pub best_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAnomaly {
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub coefficient_of_variation: Decimal,
    pub variance_pct: Decimal,
}

/// Median after discarding prices outside the 1.5 x IQR fences. Falls back to the
/// plain median if the fences exclude everything.
pub fn fair_price(prices: &[Decimal]) -> Result<Decimal, RulesError> {
    let mut sorted = prices.to_vec();
    sorted.sort();
    if sorted.is_empty() {
        return Err(RulesError::EmptyInput);
    }

    let q1 = percentile(&sorted, Decimal::new(25, 2));
    let q3 = percentile(&sorted, Decimal::new(75, 2));
    let iqr = q3 - q1;
    // A fence outside the decimal range excludes nothing on that side.
    let fence = iqr.checked_mul(QUARTILE_FENCE);
    let lower = fence.and_then(|fence| q1.checked_sub(fence)).unwrap_or(Decimal::MIN);
    let upper = fence.and_then(|fence| q3.checked_add(fence)).unwrap_or(Decimal::MAX);

    let filtered: Vec<Decimal> =
        sorted.iter().copied().filter(|price| *price >= lower && *price <= upper).collect();
    if filtered.is_empty() {
        return median_of_sorted(&sorted);
    }
    median_of_sorted(&filtered)
}

/// Linear-interpolated percentile over an already sorted, non-empty slice.
fn percentile(sorted: &[Decimal], fraction: Decimal) -> Decimal {
    let last = sorted.len() - 1;
    let position = Decimal::from(last) * fraction;
    let floor = position.floor();
    let lower_index = floor.to_usize().unwrap_or(0).min(last);
    let upper_index = (lower_index + 1).min(last);
    let weight = position - floor;

    sorted[lower_index] + (sorted[upper_index] - sorted[lower_index]) * weight
}

/// Savings available by moving from the most expensive supplier to the cheapest.
pub fn savings_opportunity(
    observations: &[PriceObservation],
) -> Result<SavingsOpportunity, RulesError> {
    let stats = aggregate(observations)?;
    let current = observations
        .iter()
        .find(|observation| observation.unit_price == stats.max_price)
        .ok_or(RulesError::EmptyInput)?;

    let savings_per_unit = stats.max_price - stats.min_price;
    let savings_pct = if stats.max_price > Decimal::ZERO {
        savings_per_unit / stats.max_price * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    Ok(SavingsOpportunity {
        savings_per_unit: round_currency(savings_per_unit),
        savings_pct: round_currency(savings_pct),
        current_supplier: current.supplier_name.clone(),
        current_price: round_currency(stats.max_price),
        best_supplier: stats.cheapest_supplier_name,
        best_price: round_currency(stats.min_price),
    })
}

/// Flags an item whose coefficient of variation (sample sd / mean) exceeds
/// `cv_threshold`. Single-supplier items are never anomalous.
pub fn price_anomaly(
    observations: &[PriceObservation],
    cv_threshold: Decimal,
) -> Result<Option<PriceAnomaly>, RulesError> {
    let stats = aggregate(observations)?;
    if stats.observation_count < 2 || stats.mean_price <= Decimal::ZERO {
        return Ok(None);
    }

    let coefficient_of_variation = stats.std_dev / stats.mean_price;
    if coefficient_of_variation <= cv_threshold {
        return Ok(None);
    }

    Ok(Some(PriceAnomaly {
        min_price: stats.min_price,
        max_price: stats.max_price,
        coefficient_of_variation: coefficient_of_variation.round_dp(4),
        variance_pct: round_currency(coefficient_of_variation * Decimal::ONE_HUNDRED),
    }))
}
