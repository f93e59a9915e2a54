use std::path::Path;

use dqg_core::categories::CategoryFilter;

use crate::commands::common::{format_quote, open_service};
use crate::error::CliError;

pub async fn run_show(category: Option<&str>, data_dir: &Path) -> Result<(), CliError> {
    let service = open_service(data_dir)?;
    let filter = match category {
        Some(category) => CategoryFilter::parse(category),
        None => service.selected_category().await,
    };

    match service.random_quote(&filter).await {
        Some(quote) => println!("{}", format_quote(&quote)),
        None => println!("No quotes available for this category."),
    }
    Ok(())
}
