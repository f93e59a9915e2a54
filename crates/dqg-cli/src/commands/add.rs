use std::path::Path;

use crate::commands::common::{format_quote, open_service, resolve_quote_text, warn_if_unsaved};
use crate::error::CliError;

/// Add a quote; returns whether it reached storage.
pub async fn run_add(text_parts: &[String], category: &str, data_dir: &Path) -> Result<bool, CliError> {
    let text = resolve_quote_text(text_parts)?;

    let service = open_service(data_dir)?;
    let quote = service.add_quote(&text, category).await?;
    let saved = !service.storage_degraded().await;
    warn_if_unsaved(saved);

    println!("{}", quote.id);
    println!("{}", format_quote(&quote));
    Ok(saved)
}
