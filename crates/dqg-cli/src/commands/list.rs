use std::path::Path;

use dqg_core::categories::CategoryFilter;

use crate::commands::common::{format_quote_lines, open_service, quote_to_list_item, QuoteListItem};
use crate::error::CliError;

pub async fn run_list(category: Option<&str>, as_json: bool, data_dir: &Path) -> Result<(), CliError> {
    let service = open_service(data_dir)?;
    let filter = category.map_or(CategoryFilter::All, CategoryFilter::parse);
    let quotes = service.filtered(&filter).await;

    if as_json {
        let json_items = quotes
            .iter()
            .map(quote_to_list_item)
            .collect::<Vec<QuoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if quotes.is_empty() {
        println!("No quotes available for this category.");
    } else {
        for line in format_quote_lines(&quotes) {
            println!("{line}");
        }
    }

    Ok(())
}
