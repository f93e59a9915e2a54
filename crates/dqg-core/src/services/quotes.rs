//! Quote service: the single owner of the store and its pending conflicts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::categories::{self, CategoryFilter};
use crate::error::{Error, Result};
use crate::ids::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
use crate::models::{ConflictResolution, Quote, QuoteId, QuoteSource};
use crate::reconcile::{self, ConflictBackups, ReconcileReport};
use crate::remote::RemoteSource;
use crate::state::SyncState;
use crate::storage::{
    KeyValueStore, KEY_CONFLICTS, KEY_LAST_SYNC, KEY_QUOTES, KEY_SELECTED_CATEGORY,
};
use crate::store::QuoteStore;
use crate::transfer::{self, ImportReport};
use crate::util::non_blank;

/// Category given to stored quotes that lost theirs.
const FALLBACK_CATEGORY: &str = "General";

/// Result of a successful sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub report: ReconcileReport,
    /// Completion time (Unix ms)
    pub synced_at: i64,
    /// Whether every write to the persistence gateway succeeded
    pub persisted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub report: ImportReport,
    pub persisted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveOutcome {
    /// The restored local quote for keep-local, `None` for keep-server
    pub restored: Option<Quote>,
    pub persisted: bool,
}

struct ServiceState {
    store: QuoteStore,
    conflicts: ConflictBackups,
    selected: CategoryFilter,
    last_sync_at: Option<i64>,
    sync_state: SyncState,
    storage_degraded: bool,
    /// Keys whose stored value could not be read and must not be overwritten
    unreadable: Vec<&'static str>,
}

/// Thread-safe service owning the quote store, conflict backups and
/// persisted preferences.
///
/// All mutation happens under one lock. The remote fetch runs outside the
/// lock, and a separate flag keeps sync passes from overlapping.
#[derive(Clone)]
pub struct QuoteService {
    state: Arc<Mutex<ServiceState>>,
    gateway: Arc<dyn KeyValueStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    syncing: Arc<AtomicBool>,
}

impl QuoteService {
    /// Open a service with random ids and the system clock.
    pub fn open(gateway: Arc<dyn KeyValueStore>) -> Self {
        Self::open_with(gateway, Arc::new(RandomIdGenerator), Arc::new(SystemClock))
    }

    /// Open a service, loading state from `gateway`.
    ///
    /// First run seeds the default quotes. A key that cannot be read keeps
    /// its stored value untouched: the service starts from defaults for it
    /// and never writes it back during this session.
    pub fn open_with(
        gateway: Arc<dyn KeyValueStore>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut unreadable = Vec::new();
        let mut read = |key: &'static str| match gateway.get(key) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!("Could not read {key}, keeping it in memory only: {error}");
                unreadable.push(key);
                None
            }
        };

        let raw_quotes = read(KEY_QUOTES);
        let raw_conflicts = read(KEY_CONFLICTS);
        let raw_selected = read(KEY_SELECTED_CATEGORY);
        let raw_last_sync = read(KEY_LAST_SYNC);

        let (store, needs_save) = match raw_quotes {
            None => (QuoteStore::seeded(ids.as_ref(), clock.as_ref()), true),
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => migrate_stored_quotes(&value, ids.as_ref(), clock.as_ref()),
                Err(error) => {
                    tracing::warn!("Failed parsing stored quotes: {error}");
                    (QuoteStore::new(), true)
                }
            },
        };

        let conflicts = raw_conflicts
            .and_then(|raw| match serde_json::from_str::<ConflictBackups>(&raw) {
                Ok(conflicts) => Some(conflicts),
                Err(error) => {
                    tracing::warn!("Discarding unreadable conflict backups: {error}");
                    None
                }
            })
            .unwrap_or_default();

        let mut state = ServiceState {
            store,
            conflicts,
            selected: raw_selected
                .as_deref()
                .map(CategoryFilter::parse)
                .unwrap_or_default(),
            last_sync_at: raw_last_sync.and_then(|raw| raw.trim().parse().ok()),
            sync_state: SyncState::Idle,
            storage_degraded: !unreadable.is_empty(),
            unreadable,
        };
        if needs_save {
            state.save_quotes(gateway.as_ref());
        }

        Self {
            state: Arc::new(Mutex::new(state)),
            gateway,
            ids,
            clock,
            syncing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn quotes(&self) -> Vec<Quote> {
        self.state.lock().await.store.as_slice().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.store.is_empty()
    }

    pub async fn get(&self, id: &QuoteId) -> Option<Quote> {
        self.state.lock().await.store.get(id).cloned()
    }

    /// Quotes matching `filter`, in store order.
    pub async fn filtered(&self, filter: &CategoryFilter) -> Vec<Quote> {
        self.state
            .lock()
            .await
            .store
            .filtered(filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn random_quote(&self, filter: &CategoryFilter) -> Option<Quote> {
        self.state.lock().await.store.random(filter).cloned()
    }

    pub async fn categories(&self) -> Vec<String> {
        categories::derive_categories(&self.state.lock().await.store)
    }

    pub async fn category_options(&self) -> Vec<String> {
        categories::category_options(&self.state.lock().await.store)
    }

    pub async fn selected_category(&self) -> CategoryFilter {
        self.state.lock().await.selected.clone()
    }

    /// Remember the category filter. Returns whether it was persisted.
    pub async fn set_selected_category(&self, filter: CategoryFilter) -> bool {
        let mut state = self.state.lock().await;
        let persisted = state.write(self.gateway.as_ref(), KEY_SELECTED_CATEGORY, filter.as_str());
        state.selected = filter;
        persisted
    }

    pub async fn add_quote(&self, text: &str, category: &str) -> Result<Quote> {
        let mut state = self.state.lock().await;
        let quote = state
            .store
            .add(text, category, self.ids.as_ref(), self.clock.as_ref())?;
        state.save_quotes(self.gateway.as_ref());
        tracing::debug!("Added quote {}", quote.id);
        Ok(quote)
    }

    pub async fn edit_quote(&self, id: &QuoteId, text: &str) -> Result<Quote> {
        let mut state = self.state.lock().await;
        let quote = state.store.edit_text(id, text, self.clock.as_ref())?;
        state.save_quotes(self.gateway.as_ref());
        Ok(quote)
    }

    /// Pretty-printed JSON of the whole store.
    pub async fn export_json(&self) -> Result<String> {
        Ok(transfer::render_json_export(&self.state.lock().await.store)?)
    }

    /// Import a JSON document given as text.
    ///
    /// Malformed JSON and non-array documents are rejected without touching
    /// the store; invalid or duplicate elements are skipped.
    pub async fn import_text(&self, text: &str) -> Result<ImportOutcome> {
        let doc = transfer::parse_import_text(text)?;

        let mut state = self.state.lock().await;
        let report = transfer::import_document(
            &doc,
            &mut state.store,
            self.ids.as_ref(),
            self.clock.as_ref(),
        )?;
        let persisted = state.save_quotes(self.gateway.as_ref());
        tracing::info!(
            "Imported {} quote(s), skipped {} invalid and {} duplicate",
            report.added,
            report.skipped_invalid,
            report.skipped_duplicate
        );
        Ok(ImportOutcome { report, persisted })
    }

    /// Fetch from `remote` and reconcile into the store.
    ///
    /// Fails with [`Error::SyncInProgress`] while another pass is running.
    /// A fetch failure leaves the store, backups and last-sync time untouched.
    pub async fn sync<R: RemoteSource>(&self, remote: &R) -> Result<SyncOutcome> {
        let _guard = SyncGuard::acquire(&self.syncing)?;

        let incoming = match remote.fetch().await {
            Ok(incoming) => incoming,
            Err(error) => {
                tracing::error!("Sync failed: {error}");
                self.state.lock().await.sync_state = SyncState::Error;
                return Err(error);
            }
        };

        let mut state = self.state.lock().await;
        let report = {
            let ServiceState {
                store, conflicts, ..
            } = &mut *state;
            reconcile::reconcile(store, incoming, conflicts)
        };

        let synced_at = self.clock.now_ms();
        let mut persisted = state.save_quotes(self.gateway.as_ref());
        persisted &= state.save_conflicts(self.gateway.as_ref());
        persisted &= state.write(self.gateway.as_ref(), KEY_LAST_SYNC, &synced_at.to_string());
        state.last_sync_at = Some(synced_at);
        state.sync_state = SyncState::Synced;

        if report.has_changes() {
            tracing::info!(
                "Sync complete: {} new, {} conflict(s)",
                report.merged,
                report.conflicts
            );
        } else {
            tracing::info!("Sync complete. No changes.");
        }

        Ok(SyncOutcome {
            report,
            synced_at,
            persisted,
        })
    }

    pub async fn pending_conflicts(&self) -> ConflictBackups {
        self.state.lock().await.conflicts.clone()
    }

    pub async fn resolve_conflict(
        &self,
        id: &QuoteId,
        resolution: ConflictResolution,
    ) -> Result<ResolveOutcome> {
        let mut state = self.state.lock().await;
        let restored = {
            let ServiceState {
                store, conflicts, ..
            } = &mut *state;
            reconcile::resolve_conflict(store, conflicts, id, resolution, self.clock.as_ref())?
        };

        let mut persisted = state.save_conflicts(self.gateway.as_ref());
        if restored.is_some() {
            persisted &= state.save_quotes(self.gateway.as_ref());
            tracing::info!("Reverted to local version for {id}");
        } else {
            tracing::info!("Kept server version for {id}");
        }

        Ok(ResolveOutcome {
            restored,
            persisted,
        })
    }

    pub async fn last_sync_at(&self) -> Option<i64> {
        self.state.lock().await.last_sync_at
    }

    /// `Syncing` while a pass holds the sync flag, otherwise the outcome of
    /// the last finished pass.
    pub async fn sync_state(&self) -> SyncState {
        if self.is_syncing() {
            return SyncState::Syncing;
        }
        self.state.lock().await.sync_state
    }

    /// Whether a storage read or write has failed; state then lives in memory only.
    pub async fn storage_degraded(&self) -> bool {
        self.state.lock().await.storage_degraded
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }
}

impl ServiceState {
    fn save_quotes(&mut self, gateway: &dyn KeyValueStore) -> bool {
        match serde_json::to_string(self.store.as_slice()) {
            Ok(raw) => self.write(gateway, KEY_QUOTES, &raw),
            Err(error) => {
                tracing::warn!("Could not serialize quotes: {error}");
                false
            }
        }
    }

    fn save_conflicts(&mut self, gateway: &dyn KeyValueStore) -> bool {
        match serde_json::to_string(&self.conflicts) {
            Ok(raw) => self.write(gateway, KEY_CONFLICTS, &raw),
            Err(error) => {
                tracing::warn!("Could not serialize conflict backups: {error}");
                false
            }
        }
    }

    fn write(&mut self, gateway: &dyn KeyValueStore, key: &str, value: &str) -> bool {
        if self.unreadable.iter().any(|unreadable| *unreadable == key) {
            tracing::debug!("Skipping write to unreadable key {key}");
            self.storage_degraded = true;
            return false;
        }
        match gateway.set(key, value) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!("Could not save {key}, continuing in memory: {error}");
                self.storage_degraded = true;
                false
            }
        }
    }
}

/// Holds the sync flag for the duration of one pass.
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::SyncInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Rebuild a store from a persisted blob, filling fields older blobs lack.
///
/// The flag is true when the rebuilt store differs from the blob and has to
/// be written back, so generated ids stay stable across sessions.
#[allow(clippy::cast_possible_truncation)] // JSON numbers may carry fractional ms
fn migrate_stored_quotes(
    value: &Value,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
) -> (QuoteStore, bool) {
    let Value::Array(elements) = value else {
        tracing::warn!("Stored quotes are not an array; starting empty");
        return (QuoteStore::new(), true);
    };

    let mut changed = false;
    let mut quotes = Vec::with_capacity(elements.len());
    for element in elements {
        let Some(fields) = element.as_object() else {
            tracing::warn!("Dropping stored quote that is not an object");
            changed = true;
            continue;
        };
        let text_field = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .and_then(non_blank)
                .map(str::to_string)
        };

        let Some(text) = text_field("text") else {
            tracing::warn!("Dropping stored quote without text");
            changed = true;
            continue;
        };
        let id = text_field("id").map(QuoteId::new).unwrap_or_else(|| {
            changed = true;
            ids.next_id()
        });
        let category = text_field("category").unwrap_or_else(|| {
            changed = true;
            FALLBACK_CATEGORY.to_string()
        });
        let updated_at = fields
            .get("updatedAt")
            .and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|ms| ms as i64)))
            .unwrap_or_else(|| {
                changed = true;
                clock.now_ms()
            });
        let source = fields
            .get("source")
            .and_then(Value::as_str)
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| {
                changed = true;
                QuoteSource::Local
            });

        let stored_text = fields.get("text").and_then(Value::as_str);
        changed |= stored_text != Some(text.as_str());

        match Quote::new(id, text, category, updated_at, source) {
            Ok(quote) => quotes.push(quote),
            Err(error) => {
                tracing::warn!("Dropping invalid stored quote: {error}");
                changed = true;
            }
        }
    }

    let kept = quotes.len();
    let store = QuoteStore::from_quotes(quotes);
    changed |= store.len() != kept;
    (store, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FixedClock, SequentialIdGenerator};
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    struct StaticRemote(Vec<Quote>);

    impl RemoteSource for StaticRemote {
        async fn fetch(&self) -> Result<Vec<Quote>> {
            Ok(self.0.clone())
        }
    }

    struct FailingRemote;

    impl RemoteSource for FailingRemote {
        async fn fetch(&self) -> Result<Vec<Quote>> {
            Err(Error::Network("Server fetch failed: HTTP 503".to_string()))
        }
    }

    /// Blocks inside `fetch` until released.
    #[derive(Default)]
    struct GatedRemote {
        started: Notify,
        release: Notify,
    }

    impl RemoteSource for GatedRemote {
        async fn fetch(&self) -> Result<Vec<Quote>> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(vec![server("srv-1", "Hello", "Server")])
        }
    }

    fn server(id: &str, text: &str, category: &str) -> Quote {
        Quote::new(QuoteId::from(id), text, category, 500, QuoteSource::Server).unwrap()
    }

    fn open(gateway: &Arc<MemoryStore>) -> (QuoteService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(1_000));
        let service = QuoteService::open_with(
            gateway.clone(),
            Arc::new(SequentialIdGenerator::new()),
            clock.clone(),
        );
        (service, clock)
    }

    fn empty_gateway() -> Arc<MemoryStore> {
        let gateway = Arc::new(MemoryStore::new());
        gateway.set(KEY_QUOTES, "[]").unwrap();
        gateway
    }

    #[tokio::test(flavor = "current_thread")]
    async fn first_open_seeds_and_persists_defaults() {
        let gateway = Arc::new(MemoryStore::new());
        let (service, _) = open(&gateway);

        assert_eq!(service.len().await, 3);
        assert_eq!(
            service.category_options().await,
            vec!["all", "Motivation", "Life", "Wisdom"]
        );
        let stored: Value = serde_json::from_str(&gateway.get(KEY_QUOTES).unwrap().unwrap()).unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 3);
        assert_eq!(service.selected_category().await, CategoryFilter::All);
        assert_eq!(service.sync_state().await, SyncState::Idle);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn open_migrates_old_blobs() {
        let gateway = Arc::new(MemoryStore::new());
        gateway
            .set(
                KEY_QUOTES,
                r#"[
                    {"text": " Old one ", "category": ""},
                    {"id": "x", "text": "Kept", "category": "Life", "updatedAt": 7, "source": "server"},
                    {"id": "x", "text": "Duplicate id", "category": "Life"},
                    {"category": "No text"}
                ]"#,
            )
            .unwrap();

        let (service, _) = open(&gateway);
        let quotes = service.quotes().await;

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].id.as_str(), "local-1");
        assert_eq!(quotes[0].text, "Old one");
        assert_eq!(quotes[0].category, "General");
        assert_eq!(quotes[0].updated_at, 1_000);
        assert_eq!(quotes[0].source, QuoteSource::Local);
        assert_eq!(quotes[1].source, QuoteSource::Server);
        assert_eq!(quotes[1].updated_at, 7);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn migrated_ids_are_written_back() {
        let gateway = Arc::new(MemoryStore::new());
        gateway
            .set(KEY_QUOTES, r#"[{"text": "Old", "category": "Life"}]"#)
            .unwrap();

        let first = QuoteService::open(gateway.clone()).quotes().await;
        let second = QuoteService::open(gateway.clone()).quotes().await;

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, second[0].id);
        let stored: Vec<Quote> =
            serde_json::from_str(&gateway.get(KEY_QUOTES).unwrap().unwrap()).unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn complete_blob_is_not_rewritten() {
        let raw = r#"[{"id":"a","text":"Kept","category":"Life","updatedAt":7,"source":"local"}]"#;
        let gateway = Arc::new(MemoryStore::new());
        gateway.set(KEY_QUOTES, raw).unwrap();
        gateway.set_simulate_write_error(true);

        let (service, _) = open(&gateway);
        assert_eq!(service.len().await, 1);
        assert!(!service.storage_degraded().await);
        assert_eq!(gateway.get(KEY_QUOTES).unwrap().as_deref(), Some(raw));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unreadable_blob_is_never_overwritten() {
        let raw = r#"[{"id":"mine","text":"My precious quote","category":"Life","updatedAt":7,"source":"local"}]"#;
        let gateway = Arc::new(MemoryStore::new());
        gateway.set(KEY_QUOTES, raw).unwrap();
        gateway.set_simulate_read_error(true);

        let (service, _) = open(&gateway);
        assert!(service.storage_degraded().await);
        assert_eq!(service.len().await, 3);

        service.add_quote("Only in memory", "Life").await.unwrap();
        let outcome = service
            .sync(&StaticRemote(vec![server("srv-1", "Hello", "Server")]))
            .await
            .unwrap();
        assert!(!outcome.persisted);
        assert_eq!(service.len().await, 5);

        gateway.set_simulate_read_error(false);
        assert_eq!(gateway.get(KEY_QUOTES).unwrap().as_deref(), Some(raw));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unreadable_blob_file_is_left_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let blob_path = dir.path().join(format!("{KEY_QUOTES}.json"));
        let mut raw = br#"[{"id":"mine","text":"My precious quote","category":"Life"}]"#.to_vec();
        raw.push(0xFF);
        std::fs::write(&blob_path, &raw).unwrap();

        let gateway = Arc::new(crate::storage::FileStore::open(dir.path()).unwrap());
        let service = QuoteService::open(gateway);
        assert!(service.storage_degraded().await);
        service.add_quote("Only in memory", "Life").await.unwrap();

        assert_eq!(std::fs::read(&blob_path).unwrap(), raw);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unparseable_blob_resets_store() {
        let gateway = Arc::new(MemoryStore::new());
        gateway.set(KEY_QUOTES, "{not json").unwrap();

        let (service, _) = open(&gateway);
        assert!(service.is_empty().await);
        assert_eq!(gateway.get(KEY_QUOTES).unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn add_and_edit_persist() {
        let gateway = empty_gateway();
        let (service, clock) = open(&gateway);

        let added = service.add_quote("Hello", "Greeting").await.unwrap();
        clock.advance(10);
        let edited = service.edit_quote(&added.id, "Hi there").await.unwrap();

        assert_eq!(edited.updated_at, 1_010);
        let (reopened, _) = open(&gateway);
        assert_eq!(reopened.get(&added.id).await.unwrap().text, "Hi there");

        assert!(matches!(
            service.add_quote(" ", "Greeting").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.edit_quote(&QuoteId::from("missing"), "x").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sync_merges_and_stamps_last_sync() {
        let gateway = empty_gateway();
        let (service, clock) = open(&gateway);
        clock.set(2_000);

        let outcome = service
            .sync(&StaticRemote(vec![server("srv-1", "Hello", "Server")]))
            .await
            .unwrap();

        assert_eq!(outcome.report.merged, 1);
        assert_eq!(outcome.report.conflicts, 0);
        assert_eq!(outcome.synced_at, 2_000);
        assert!(outcome.persisted);
        assert_eq!(service.last_sync_at().await, Some(2_000));
        assert_eq!(service.sync_state().await, SyncState::Synced);
        assert_eq!(gateway.get(KEY_LAST_SYNC).unwrap().as_deref(), Some("2000"));
        assert_eq!(service.categories().await, vec!["Server"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_fetch_leaves_everything_untouched() {
        let gateway = empty_gateway();
        let (service, _) = open(&gateway);
        service.add_quote("Mine", "Life").await.unwrap();
        let before = service.quotes().await;

        let result = service.sync(&FailingRemote).await;

        assert!(result.unwrap_err().is_network());
        assert_eq!(service.quotes().await, before);
        assert!(service.pending_conflicts().await.is_empty());
        assert_eq!(service.last_sync_at().await, None);
        assert_eq!(service.sync_state().await, SyncState::Error);
        assert!(!service.is_syncing());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn conflict_backup_survives_reopen_and_keep_local_restores() {
        let gateway = empty_gateway();
        let (service, clock) = open(&gateway);
        service
            .sync(&StaticRemote(vec![server("srv-1", "Original", "Server")]))
            .await
            .unwrap();
        let id = QuoteId::from("srv-1");
        service.edit_quote(&id, "My edit").await.unwrap();

        let outcome = service
            .sync(&StaticRemote(vec![server("srv-1", "Original", "Server")]))
            .await
            .unwrap();
        assert_eq!(outcome.report.conflicts, 1);
        assert_eq!(service.get(&id).await.unwrap().text, "Original");

        let (reopened, _) = open(&gateway);
        let pending = reopened.pending_conflicts().await;
        assert_eq!(pending[&id].local.text, "My edit");

        clock.set(9_000);
        let resolved = service
            .resolve_conflict(&id, ConflictResolution::KeepLocal)
            .await
            .unwrap();
        let restored = resolved.restored.unwrap();
        assert_eq!(restored.text, "My edit");
        assert_eq!(restored.source, QuoteSource::Local);
        assert_eq!(restored.updated_at, 9_000);
        assert!(service.pending_conflicts().await.is_empty());

        let (reopened, _) = open(&gateway);
        assert_eq!(reopened.get(&id).await.unwrap().text, "My edit");
        assert!(reopened.pending_conflicts().await.is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn keep_server_leaves_store() {
        let gateway = empty_gateway();
        let (service, _) = open(&gateway);
        service
            .sync(&StaticRemote(vec![server("srv-1", "A", "Server")]))
            .await
            .unwrap();
        let id = QuoteId::from("srv-1");
        service.edit_quote(&id, "B").await.unwrap();
        service
            .sync(&StaticRemote(vec![server("srv-1", "A", "Server")]))
            .await
            .unwrap();

        let outcome = service
            .resolve_conflict(&id, ConflictResolution::KeepServer)
            .await
            .unwrap();
        assert_eq!(outcome.restored, None);
        assert_eq!(service.get(&id).await.unwrap().text, "A");
        assert!(matches!(
            service
                .resolve_conflict(&id, ConflictResolution::KeepServer)
                .await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn overlapping_sync_is_rejected() {
        let gateway = empty_gateway();
        let (service, _) = open(&gateway);
        let remote = Arc::new(GatedRemote::default());

        let first = tokio::spawn({
            let service = service.clone();
            let remote = remote.clone();
            async move { service.sync(remote.as_ref()).await }
        });
        remote.started.notified().await;

        assert!(service.is_syncing());
        assert_eq!(service.sync_state().await, SyncState::Syncing);
        let second = service
            .sync(&StaticRemote(vec![server("srv-2", "Other", "Server")]))
            .await;
        assert!(matches!(second, Err(Error::SyncInProgress)));
        assert!(service.is_empty().await);

        remote.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.report.merged, 1);
        assert!(!service.is_syncing());
        assert_eq!(service.len().await, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn dropped_sync_does_not_stay_syncing() {
        let gateway = empty_gateway();
        let (service, _) = open(&gateway);
        let remote = GatedRemote::default();

        tokio::select! {
            biased;
            _ = service.sync(&remote) => unreachable!("fetch is gated"),
            () = remote.started.notified() => {}
        }

        assert!(!service.is_syncing());
        assert_eq!(service.sync_state().await, SyncState::Idle);
        assert!(service.is_empty().await);

        let outcome = service
            .sync(&StaticRemote(vec![server("srv-1", "Hello", "Server")]))
            .await
            .unwrap();
        assert_eq!(outcome.report.merged, 1);
        assert_eq!(service.sync_state().await, SyncState::Synced);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn storage_failure_degrades_to_memory() {
        let gateway = empty_gateway();
        let (service, _) = open(&gateway);
        gateway.set_simulate_write_error(true);

        let added = service.add_quote("Still here", "Life").await.unwrap();
        assert_eq!(service.get(&added.id).await.unwrap().text, "Still here");
        assert!(service.storage_degraded().await);

        let outcome = service
            .sync(&StaticRemote(vec![server("srv-1", "Hello", "Server")]))
            .await
            .unwrap();
        assert!(!outcome.persisted);
        assert_eq!(service.len().await, 2);
        assert_eq!(gateway.get(KEY_QUOTES).unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn import_text_failure_modes() {
        let gateway = empty_gateway();
        let (service, _) = open(&gateway);
        service.add_quote("A", "B").await.unwrap();

        assert!(matches!(
            service.import_text("not json").await,
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            service.import_text(r#"{"text": "A", "category": "B"}"#).await,
            Err(Error::InvalidFormat(_))
        ));
        assert_eq!(service.len().await, 1);

        let outcome = service
            .import_text(r#"[{"text": "A", "category": "B"}, {"text": "C", "category": "D"}, {}]"#)
            .await
            .unwrap();
        assert_eq!(outcome.report.added, 1);
        assert_eq!(outcome.report.skipped_duplicate, 1);
        assert_eq!(outcome.report.skipped_invalid, 1);
        assert_eq!(service.len().await, 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn export_import_round_trip_between_services() {
        let source_gateway = empty_gateway();
        let (source, _) = open(&source_gateway);
        source.add_quote("One", "A").await.unwrap();
        source.add_quote("Two", "B").await.unwrap();
        let exported = source.export_json().await.unwrap();

        let (target, _) = open(&empty_gateway());
        target.import_text(&exported).await.unwrap();

        assert_eq!(target.quotes().await, source.quotes().await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn selected_category_round_trip() {
        let gateway = empty_gateway();
        let (service, _) = open(&gateway);

        assert!(service.set_selected_category(CategoryFilter::named("Life")).await);
        let (reopened, _) = open(&gateway);
        assert_eq!(reopened.selected_category().await, CategoryFilter::named("Life"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn random_quote_uses_filter() {
        let gateway = empty_gateway();
        let (service, _) = open(&gateway);
        service.add_quote("A", "Life").await.unwrap();
        service.add_quote("B", "Work").await.unwrap();

        let picked = service
            .random_quote(&CategoryFilter::named("Work"))
            .await
            .unwrap();
        assert_eq!(picked.text, "B");
        assert!(service
            .random_quote(&CategoryFilter::named("Nope"))
            .await
            .is_none());
        assert_eq!(service.filtered(&CategoryFilter::named("Life")).await.len(), 1);
    }
}
