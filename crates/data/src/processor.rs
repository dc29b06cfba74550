use procura_core::domain::observation::{DemandLevel, PriceObservation, SupplierId};
use procura_core::engine::aggregator::{aggregate, MarketStatistics};
use procura_core::engine::analysis::{
    fair_price, price_anomaly, savings_opportunity, PriceAnomaly, SavingsOpportunity,
};
use procura_core::engine::round_currency;
use procura_core::errors::RulesError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::loader::{ItemId, ProcurementDataset};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item_id: ItemId,
    pub item_name: String,
    pub supplier_count: usize,
    pub avg_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub average_stock: Decimal,
    pub typical_demand: DemandLevel,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub unit_price: Decimal,
    pub stock_level: u32,
    pub demand_level: DemandLevel,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAnomaly {
    pub item_id: ItemId,
    pub item_name: String,
    pub anomaly: PriceAnomaly,
}

/// Per-item views over a loaded dataset.
pub struct ItemProcessor<'a> {
    dataset: &'a ProcurementDataset,
}

impl<'a> ItemProcessor<'a> {
    pub fn new(dataset: &'a ProcurementDataset) -> Self {
        Self { dataset }
    }

    /// `None` when the item has no rows.
    pub fn summary(&self, item_id: &ItemId) -> Option<ItemSummary> {
        let observations = self.dataset.observations(item_id);
        let stats = aggregate(&observations).ok()?;
        let item_name = self.dataset.item_name(item_id)?.to_string();

        let total_stock: Decimal =
            observations.iter().map(|observation| Decimal::from(observation.stock_level)).sum();
        let average_stock = (total_stock / Decimal::from(observations.len()))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

        Some(ItemSummary {
            item_id: item_id.clone(),
            item_name,
            supplier_count: stats.observation_count,
            avg_price: round_currency(stats.mean_price),
            min_price: round_currency(stats.min_price),
            max_price: round_currency(stats.max_price),
            average_stock,
            typical_demand: modal_demand(&observations)?,
        })
    }

    /// Supplier rows ordered by unit price; equal prices keep file order.
    pub fn comparison_table(&self, item_id: &ItemId) -> Vec<ComparisonRow> {
        let mut rows: Vec<ComparisonRow> = self
            .dataset
            .observations(item_id)
            .into_iter()
            .map(|observation| ComparisonRow {
                supplier_id: observation.supplier_id,
                supplier_name: observation.supplier_name,
                unit_price: observation.unit_price,
                stock_level: observation.stock_level,
                demand_level: observation.demand_level,
            })
            .collect();
        rows.sort_by(|left, right| left.unit_price.cmp(&right.unit_price));
        rows
    }

    pub fn price_statistics(&self, item_id: &ItemId) -> Result<MarketStatistics, RulesError> {
        aggregate(&self.dataset.observations(item_id))
    }

    pub fn fair_price(&self, item_id: &ItemId) -> Result<Decimal, RulesError> {
        let prices: Vec<Decimal> = self
            .dataset
            .observations(item_id)
            .iter()
            .map(|observation| observation.unit_price)
            .collect();
        fair_price(&prices)
    }

    pub fn savings(&self, item_id: &ItemId) -> Result<SavingsOpportunity, RulesError> {
        savings_opportunity(&self.dataset.observations(item_id))
    }

    pub fn suppliers_within_price(
        &self,
        item_id: &ItemId,
        max_price: Decimal,
    ) -> Vec<PriceObservation> {
        self.dataset
            .observations(item_id)
            .into_iter()
            .filter(|observation| observation.unit_price <= max_price)
            .collect()
    }

    pub fn reliable_suppliers(&self, item_id: &ItemId, min_stock: u32) -> Vec<PriceObservation> {
        self.dataset
            .observations(item_id)
            .into_iter()
            .filter(|observation| observation.stock_level >= min_stock)
            .collect()
    }

    pub fn best_value_suppliers(&self, item_id: &ItemId, top_n: usize) -> Vec<PriceObservation> {
        let mut observations = self.dataset.observations(item_id);
        observations.sort_by(|left, right| left.unit_price.cmp(&right.unit_price));
        observations.truncate(top_n);
        observations
    }

    /// Items whose supplier prices vary more than `cv_threshold`, in item-name order.
    pub fn anomalies(&self, cv_threshold: Decimal) -> Result<Vec<ItemAnomaly>, RulesError> {
        let mut anomalies = Vec::new();
        for (item_id, item_name) in self.dataset.items() {
            let observations = self.dataset.observations(&item_id);
            if let Some(anomaly) = price_anomaly(&observations, cv_threshold)? {
                anomalies.push(ItemAnomaly { item_id, item_name, anomaly });
            }
        }
        Ok(anomalies)
    }
}

/// Most frequent demand level; ties go to the alphabetically first label.
fn modal_demand(observations: &[PriceObservation]) -> Option<DemandLevel> {
    let mut counts: Vec<(DemandLevel, usize)> = Vec::new();
    for observation in observations {
        match counts.iter_mut().find(|(level, _)| *level == observation.demand_level) {
            Some((_, count)) => *count += 1,
            None => counts.push((observation.demand_level, 1)),
        }
    }

    counts
        .into_iter()
        .max_by(|(left, left_count), (right, right_count)| {
            left_count.cmp(right_count).then_with(|| right.as_str().cmp(left.as_str()))
        })
        .map(|(level, _)| level)
}
