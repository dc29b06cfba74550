use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use procura_core::domain::observation::{DemandLevel, PriceObservation, SupplierId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "item_id",
    "item_name",
    "supplier_id",
    "supplier_name",
    "unit_price",
    "stock_level",
    "demand_level",
    "last_updated",
];

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

#[derive(Debug, Error)]
pub enum DataError {
    #[error("data file not found: `{0}`")]
    NotFound(PathBuf),
    #[error("could not open data file `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("invalid row at line {line}: {message}")]
    InvalidRow { line: u64, message: String },
}

/// A price observation tagged with the item it quotes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_id: ItemId,
    pub item_name: String,
    pub observation: PriceObservation,
}

#[derive(Clone, Debug, Default)]
pub struct ProcurementDataset {
    records: Vec<ItemRecord>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    item_id: String,
    item_name: String,
    supplier_id: String,
    supplier_name: String,
    unit_price: String,
    stock_level: String,
    demand_level: String,
    last_updated: String,
}

impl ProcurementDataset {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            return Err(DataError::NotFound(path.to_path_buf()));
        }

        let file = File::open(path)
            .map_err(|source| DataError::Io { path: path.to_path_buf(), source })?;
        let dataset = Self::from_reader(file)?;

        tracing::info!(
            event_name = "system.data.dataset_loaded",
            path = %path.display(),
            rows = dataset.records.len(),
            items = dataset.items().len(),
            "procurement dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = reader.headers()?.clone();
        let present: BTreeSet<&str> = headers.iter().collect();
        let mut missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !present.contains(**column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(DataError::MissingColumns(missing));
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            // Physical line where the row starts; blank lines and quoted newlines count.
            let line = row.position().map_or(0, csv::Position::line);
            let raw: RawRow = row.deserialize(Some(&headers))?;
            let record =
                parse_row(raw).map_err(|message| DataError::InvalidRow { line, message })?;
            records.push(record);
        }

        tracing::debug!(
            event_name = "system.data.rows_parsed",
            rows = records.len(),
            "parsed procurement rows"
        );
        Ok(Self { records })
    }

    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique `(item_id, item_name)` pairs ordered by name.
    pub fn items(&self) -> Vec<(ItemId, String)> {
        let unique: BTreeSet<(&str, &ItemId)> = self
            .records
            .iter()
            .map(|record| (record.item_name.as_str(), &record.item_id))
            .collect();

        unique.into_iter().map(|(name, id)| (id.clone(), name.to_string())).collect()
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.records.iter().any(|record| &record.item_id == item_id)
    }

    pub fn item_name(&self, item_id: &ItemId) -> Option<&str> {
        self.records
            .iter()
            .find(|record| &record.item_id == item_id)
            .map(|record| record.item_name.as_str())
    }

    /// Observations for one item, in file order.
    pub fn observations(&self, item_id: &ItemId) -> Vec<PriceObservation> {
        self.records
            .iter()
            .filter(|record| &record.item_id == item_id)
            .map(|record| record.observation.clone())
            .collect()
    }

    pub fn supplier_prices(&self, item_id: &ItemId) -> Vec<(String, Decimal)> {
        self.records
            .iter()
            .filter(|record| &record.item_id == item_id)
            .map(|record| (record.observation.supplier_name.clone(), record.observation.unit_price))
            .collect()
    }
}

fn parse_row(row: RawRow) -> Result<ItemRecord, String> {
    if row.item_id.is_empty() {
        return Err("item_id is empty".to_string());
    }
    if row.supplier_name.is_empty() {
        return Err("supplier_name is empty".to_string());
    }

    let unit_price = Decimal::from_str(&row.unit_price)
        .map_err(|_| format!("unit_price `{}` is not a number", row.unit_price))?;
    if unit_price <= Decimal::ZERO {
        return Err(format!("unit_price `{}` must be greater than zero", row.unit_price));
    }

    let stock_level = row
        .stock_level
        .parse::<i64>()
        .map_err(|_| format!("stock_level `{}` is not an integer", row.stock_level))?;
    let stock_level = u32::try_from(stock_level)
        .map_err(|_| format!("stock_level `{}` is out of range", row.stock_level))?;

    let demand_level =
        DemandLevel::from_str(&row.demand_level).map_err(|error| error.to_string())?;
    let observed_at = parse_date(&row.last_updated)?;

    Ok(ItemRecord {
        item_id: ItemId(row.item_id),
        item_name: row.item_name,
        observation: PriceObservation {
            supplier_id: SupplierId(row.supplier_id),
            supplier_name: row.supplier_name,
            unit_price,
            stock_level,
            demand_level,
            observed_at,
        },
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|stamp| stamp.date())
        })
        .map_err(|_| format!("last_updated `{value}` is not a YYYY-MM-DD date"))
}
