use std::path::Path;

use crate::commands::common::{
    capture_editor_input_with_initial, normalize_content, normalize_quote_identifier,
    open_service, resolve_quote_id, warn_if_unsaved,
};
use crate::error::CliError;

/// Edit a quote's text; returns whether the change reached storage.
pub async fn run_edit(id: &str, text_parts: &[String], data_dir: &Path) -> Result<bool, CliError> {
    let normalized_id = normalize_quote_identifier(id)?;
    let service = open_service(data_dir)?;
    let quote_id = resolve_quote_id(&normalized_id, &service).await?;
    let current = service
        .get(&quote_id)
        .await
        .ok_or_else(|| CliError::QuoteNotFound(normalized_id.clone()))?;

    let edited_text = match normalize_content(&text_parts.join(" ")) {
        Some(text) => text,
        None => capture_editor_input_with_initial(&current.text)?
            .ok_or(CliError::EmptyEditedContent)?,
    };

    if edited_text == current.text {
        println!("{}", current.id);
        return Ok(true);
    }

    let updated = service.edit_quote(&quote_id, &edited_text).await?;
    let saved = !service.storage_degraded().await;
    warn_if_unsaved(saved);

    println!("{}", updated.id);
    if updated.id.is_remote() {
        println!("Quote edited locally. The next sync will report a conflict if the server copy differs.");
    }
    Ok(saved)
}
