use std::path::Path;

use dqg_core::categories::CategoryFilter;

use crate::commands::common::{open_service, warn_if_unsaved};
use crate::error::CliError;

pub async fn run_categories(as_json: bool, data_dir: &Path) -> Result<(), CliError> {
    let service = open_service(data_dir)?;
    let options = service.category_options().await;
    let selected = service.selected_category().await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    for option in options {
        let marker = if option == selected.as_str() { "*" } else { " " };
        println!("{marker} {option}");
    }
    Ok(())
}

/// Print the selected category, or select `name`.
pub async fn run_category(name: Option<&str>, data_dir: &Path) -> Result<(), CliError> {
    let service = open_service(data_dir)?;

    let Some(name) = name else {
        println!("{}", service.selected_category().await);
        return Ok(());
    };

    let filter = CategoryFilter::parse(name);
    if let CategoryFilter::Named(category) = &filter {
        if !service.categories().await.contains(category) {
            eprintln!("Note: no quotes in category '{category}' yet.");
        }
    }

    warn_if_unsaved(service.set_selected_category(filter.clone()).await);
    println!("{filter}");
    Ok(())
}
