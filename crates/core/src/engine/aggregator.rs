use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::observation::PriceObservation;
use crate::errors::RulesError;

/// Market statistics for one item, derived from exactly the observations passed in.
/// Values carry full precision; rounding is left to presentation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatistics {
    pub observation_count: usize,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub mean_price: Decimal,
    pub median_price: Decimal,
    pub price_range: Decimal,
    pub std_dev: Decimal,
    pub cheapest_supplier_name: String,
    pub cheapest_price: Decimal,
}

pub trait PriceAggregator: Send + Sync {
    fn aggregate(&self, observations: &[PriceObservation]) -> Result<MarketStatistics, RulesError>;
}

#[derive(Default)]
pub struct DeterministicPriceAggregator;

impl PriceAggregator for DeterministicPriceAggregator {
    fn aggregate(&self, observations: &[PriceObservation]) -> Result<MarketStatistics, RulesError> {
        aggregate(observations)
    }
}

pub fn aggregate(observations: &[PriceObservation]) -> Result<MarketStatistics, RulesError> {
    aggregate_prices(
        observations
            .iter()
            .map(|observation| (observation.supplier_name.as_str(), observation.unit_price)),
    )
}

/// Reduces `(supplier_name, unit_price)` pairs. The cheapest supplier is the first
/// pair holding the minimum price.
pub fn aggregate_prices<'a, I>(prices: I) -> Result<MarketStatistics, RulesError>
where
    I: IntoIterator<Item = (&'a str, Decimal)>,
{
    let mut cheapest: Option<(&str, Decimal)> = None;
    let mut max_price: Option<Decimal> = None;
    let mut values = Vec::new();

    for (supplier_name, unit_price) in prices {
        if cheapest.map_or(true, |(_, price)| unit_price < price) {
            cheapest = Some((supplier_name, unit_price));
        }
        if max_price.map_or(true, |price| unit_price > price) {
            max_price = Some(unit_price);
        }
        values.push(unit_price);
    }

    let (Some((cheapest_supplier_name, cheapest_price)), Some(max_price)) = (cheapest, max_price)
    else {
        return Err(RulesError::EmptyInput);
    };

    let mean_price = mean(&values)?;
    let median_price = median(&values)?;
    let std_dev = sample_std_dev(&values, mean_price);

    Ok(MarketStatistics {
        observation_count: values.len(),
        min_price: cheapest_price,
        max_price,
        mean_price,
        median_price,
        price_range: max_price - cheapest_price,
        std_dev,
        cheapest_supplier_name: cheapest_supplier_name.to_string(),
        cheapest_price,
    })
}

pub(crate) fn mean(values: &[Decimal]) -> Result<Decimal, RulesError> {
    if values.is_empty() {
        return Err(RulesError::EmptyInput);
    }
    let total = values
        .iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(*value))
        .ok_or(RulesError::Overflow { operation: "mean price" })?;
    total
        .checked_div(Decimal::from(values.len()))
        .ok_or(RulesError::Overflow { operation: "mean price" })
}

pub(crate) fn median(values: &[Decimal]) -> Result<Decimal, RulesError> {
    let mut sorted = values.to_vec();
    sorted.sort();
    median_of_sorted(&sorted)
}

pub(crate) fn median_of_sorted(sorted: &[Decimal]) -> Result<Decimal, RulesError> {
    let count = sorted.len();
    if count == 0 {
        return Err(RulesError::EmptyInput);
    }

    let middle = count / 2;
    if count % 2 == 1 {
        Ok(sorted[middle])
    } else {
        let (lower, upper) = (sorted[middle - 1], sorted[middle]);
        Ok(lower + (upper - lower) / Decimal::TWO)
    }
}

/// Sample standard deviation (n - 1 denominator); zero for fewer than two values.
/// Deviations are squared and summed in `f64`.
pub(crate) fn sample_std_dev(values: &[Decimal], mean: Decimal) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let Some(mean) = mean.to_f64() else {
        return Decimal::ZERO;
    };

    let squared: f64 = values
        .iter()
        .filter_map(ToPrimitive::to_f64)
        .map(|value| (value - mean).powi(2))
        .sum();
    let variance = squared / (values.len() - 1) as f64;

    Decimal::from_f64(variance.sqrt()).unwrap_or(Decimal::ZERO)
}
