use procura_core::config::LoadOptions;
use procura_data::{ItemId, ItemProcessor};
use serde::Serialize;

use crate::commands::{to_value, CommandContext, CommandResult};

const COMMAND: &str = "items";

#[derive(Debug, Serialize)]
struct ItemListing {
    item_id: ItemId,
    item_name: String,
    supplier_count: usize,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let context = match CommandContext::load(COMMAND, options) {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let processor = ItemProcessor::new(&context.dataset);
    let listings: Vec<ItemListing> = context
        .dataset
        .items()
        .into_iter()
        .map(|(item_id, item_name)| {
            let supplier_count =
                processor.summary(&item_id).map_or(0, |summary| summary.supplier_count);
            ItemListing { item_id, item_name, supplier_count }
        })
        .collect();

    let data = match to_value(COMMAND, &listings) {
        Ok(data) => data,
        Err(failure) => return failure,
    };
    CommandResult::success_with_data(COMMAND, format!("{} items", listings.len()), data)
}
