pub mod loader;
pub mod processor;

pub use loader::{DataError, ItemId, ItemRecord, ProcurementDataset, REQUIRED_COLUMNS};
pub use processor::{ComparisonRow, ItemAnomaly, ItemProcessor, ItemSummary};
