use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::observation::DemandLevel;

pub const LOW_STOCK_CEILING: i64 = 50;
pub const MEDIUM_STOCK_CEILING: i64 = 150;

/// Classification of an on-hand stock quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockTier {
    Low,
    Medium,
    High,
}

impl StockTier {
    /// `< 50` is Low, `50..150` is Medium, anything above is High.
    pub fn classify(stock: i64) -> Self {
        if stock < LOW_STOCK_CEILING {
            Self::Low
        } else if stock < MEDIUM_STOCK_CEILING {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for StockTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    BuyNow,
    ConsiderBuying,
    Wait,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Self::BuyNow => "Buy Now",
            Self::ConsiderBuying => "Consider Buying",
            Self::Wait => "Wait",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Names the row of the decision table that produced a [`Decision`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    UrgentRestock,
    ModerateStockHighDemand,
    DiscountedSurplus,
    SufficientStock,
}

impl ReasonCode {
    pub fn decision(self) -> Decision {
        match self {
            Self::UrgentRestock => Decision::BuyNow,
            Self::ModerateStockHighDemand | Self::DiscountedSurplus => Decision::ConsiderBuying,
            Self::SufficientStock => Decision::Wait,
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            Self::UrgentRestock => {
                "Low inventory combined with high demand requires urgent procurement action."
            }
            Self::ModerateStockHighDemand => {
                "Moderate inventory with high demand. Consider purchase if pricing is favorable."
            }
            Self::DiscountedSurplus => {
                "High inventory, but the price is at least 15% below market average. Consider buying ahead."
            }
            Self::SufficientStock => {
                "Current stock levels are sufficient. Monitor for price improvements."
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub decision: Decision,
    pub suggested_price: Decimal,
    pub tier: StockTier,
    pub demand: DemandLevel,
    pub reason: ReasonCode,
    pub reasoning: String,
}
