use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use dqg_core::config::AppConfig;
use dqg_core::reconcile::ConflictBackups;
use dqg_core::services::QuoteService;
use dqg_core::storage::FileStore;
use dqg_core::{ConflictBackup, Quote, QuoteId};
use serde::Serialize;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Serialize)]
pub struct QuoteListItem {
    pub id: String,
    pub text: String,
    pub category: String,
    pub source: String,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct ConflictItem {
    pub id: String,
    pub local_text: String,
    pub local_category: String,
    pub server_text: String,
    pub server_category: String,
    pub server_updated_at: i64,
}

pub fn open_service(data_dir: &Path) -> Result<QuoteService, CliError> {
    tracing::debug!("Opening quote data in {}", data_dir.display());
    let store = FileStore::open(data_dir)?;
    Ok(QuoteService::open(Arc::new(store)))
}

pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> PathBuf {
    cli_data_dir
        .or_else(|| env::var_os("DQG_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(default_data_dir)
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dqg")
}

pub fn resolve_config_path(cli_config: Option<PathBuf>) -> PathBuf {
    cli_config.unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dqg")
            .join(CONFIG_FILE_NAME)
    })
}

pub fn load_config(path: &Path) -> Result<AppConfig, CliError> {
    AppConfig::load_from_path(path)
        .map_err(|error| CliError::Config(format!("{}: {error}", path.display())))
}

/// Resolve a full quote id or a unique id prefix.
pub async fn resolve_quote_id(query: &str, service: &QuoteService) -> Result<QuoteId, CliError> {
    let exact = QuoteId::from(query);
    if service.get(&exact).await.is_some() {
        return Ok(exact);
    }

    let matching_ids = service
        .quotes()
        .await
        .into_iter()
        .map(|quote| quote.id)
        .filter(|id| id.as_str().starts_with(query))
        .collect::<Vec<_>>();

    match matching_ids.as_slice() {
        [] => Err(CliError::QuoteNotFound(query.to_string())),
        [id] => Ok(id.clone()),
        _ => {
            let options = matching_ids
                .iter()
                .take(3)
                .map(QuoteId::to_string)
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousQuoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Resolve a conflict id or unique prefix among pending conflicts.
pub fn resolve_conflict_id(query: &str, conflicts: &ConflictBackups) -> Result<QuoteId, CliError> {
    let exact = QuoteId::from(query);
    if conflicts.contains_key(&exact) {
        return Ok(exact);
    }

    let matching_ids = conflicts
        .keys()
        .filter(|id| id.as_str().starts_with(query))
        .cloned()
        .collect::<Vec<_>>();

    match matching_ids.as_slice() {
        [id] => Ok(id.clone()),
        [] => Err(CliError::QuoteNotFound(query.to_string())),
        _ => Err(CliError::AmbiguousQuoteId(format!(
            "ID prefix '{query}' matches several pending conflicts"
        ))),
    }
}

pub fn format_quote(quote: &Quote) -> String {
    format!("\"{}\" - ({})", quote.text, quote.category)
}

pub fn format_quote_lines(quotes: &[Quote]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    quotes
        .iter()
        .map(|quote| {
            let preview = text_preview(&quote.text, 50);
            let relative_time = format_relative_time(quote.updated_at, now_ms);
            format!(
                "{:<20}  {preview:<50}  {:<12}  {:<6}  {relative_time}",
                quote.id, quote.category, quote.source
            )
        })
        .collect()
}

pub fn quote_to_list_item(quote: &Quote) -> QuoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    QuoteListItem {
        id: quote.id.to_string(),
        text: quote.text.clone(),
        category: quote.category.clone(),
        source: quote.source.to_string(),
        updated_at: quote.updated_at,
        relative_time: format_relative_time(quote.updated_at, now_ms),
    }
}

pub fn conflict_to_item(id: &QuoteId, backup: &ConflictBackup) -> ConflictItem {
    ConflictItem {
        id: id.to_string(),
        local_text: backup.local.text.clone(),
        local_category: backup.local.category.clone(),
        server_text: backup.server.text.clone(),
        server_category: backup.server.category.clone(),
        server_updated_at: backup.server.updated_at,
    }
}

pub fn format_conflict_lines(conflicts: &ConflictBackups) -> Vec<String> {
    conflicts
        .iter()
        .map(|(id, backup)| {
            format!(
                "{id}  local=\"{}\" ({})  server=\"{}\" ({})",
                text_preview(&backup.local.text, 40),
                backup.local.category,
                text_preview(&backup.server.text, 40),
                backup.server.category
            )
        })
        .collect()
}

pub fn text_preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    const MINUTE: i64 = 60_000;
    const DAY: i64 = 24 * 60 * MINUTE;
    const UNITS: [(i64, &str); 6] = [
        (365 * DAY, "y"),
        (30 * DAY, "mo"),
        (7 * DAY, "w"),
        (DAY, "d"),
        (60 * MINUTE, "h"),
        (MINUTE, "m"),
    ];

    let elapsed = now_ms.saturating_sub(timestamp_ms);
    UNITS
        .iter()
        .find(|(span, _)| elapsed >= *span)
        .map_or_else(
            || "just now".to_string(),
            |(span, unit)| format!("{}{unit} ago", elapsed / span),
        )
}

pub fn warn_if_unsaved(persisted: bool) {
    if !persisted {
        eprintln!("Warning: could not save quotes to storage; changes are kept in memory only.");
    }
}

pub fn resolve_quote_text(text_parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_content(&text_parts.join(" ")) {
        return Ok(text);
    }

    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }

    if let Some(text) = capture_editor_input()? {
        return Ok(text);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_quote_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyQuoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut piped = String::new();
    stdin.read_to_string(&mut piped)?;
    Ok(normalize_content(&piped))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

/// Open the user's editor on a scratch file seeded with `initial` and
/// return the saved text.
pub fn capture_editor_input_with_initial(initial: &str) -> Result<Option<String>, CliError> {
    let scratch = create_temp_quote_file_path();
    std::fs::write(&scratch, initial)?;

    let edited = launch_editor(&preferred_editor(), &scratch)
        .and_then(|()| std::fs::read_to_string(&scratch).map_err(CliError::from));
    let _ = std::fs::remove_file(&scratch);

    Ok(normalize_content(&edited?))
}

/// Run `editor` on `file_path`. The editor string may carry arguments,
/// as in `code --wait`.
pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| CliError::EditorFailed("empty EDITOR command".to_string()))?;

    let status = Command::new(program)
        .args(parts)
        .arg(file_path)
        .status()
        .map_err(|error| CliError::EditorFailed(format!("`{editor}`: {error}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}

pub fn preferred_editor() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .find_map(|key| env::var(key).ok().and_then(|value| normalize_content(&value)))
        .unwrap_or_else(|| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_quote_file_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.subsec_nanos());
    env::temp_dir().join(format!("dqg-quote-{}-{nanos}.txt", std::process::id()))
}
