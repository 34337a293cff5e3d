//! The price book: what the UI talks to.
//!
//! `PriceBook` ties the inventory cache, the lookup engine and the history
//! ledger together behind the handful of calls a front end needs. It is
//! built once per session and handed to the UI by reference.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::history::HistoryLedger;
use crate::inventory::{CacheState, CacheStatus, InventoryCache};
use crate::lookup;
use crate::models::Product;
use crate::remote::{DatasetSource, FetchError};
use crate::store::Store;

/// Result of one operator query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub matches: Vec<Product>,
    /// True when this lookup added an entry to the history.
    pub recorded_to_history: bool,
}

pub struct PriceBook<S: DatasetSource> {
    source: S,
    inventory: InventoryCache,
    history: HistoryLedger,
    min_partial_query_len: usize,
}

impl<S: DatasetSource> PriceBook<S> {
    pub fn new(source: S, store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            source,
            inventory: InventoryCache::new(store.clone()),
            history: HistoryLedger::new(store, config.history_cap),
            min_partial_query_len: config.min_partial_query_len,
        }
    }

    /// Startup sequence: restore history, then fetch or fall back.
    pub async fn initialize(&mut self) -> CacheState {
        self.restore_history();
        let state = self.refresh().await;
        info!(
            state = ?state,
            products = self.inventory.products().len(),
            history = self.history.len(),
            "Price book initialized"
        );
        state
    }

    /// Load the persisted history. Part of `initialize`; front ends that
    /// fetch in the background call it on its own first.
    pub fn restore_history(&mut self) {
        self.history.restore();
    }

    /// Fetch the sheet again and resolve the new cache state.
    pub async fn refresh(&mut self) -> CacheState {
        self.inventory.refresh(&self.source).await
    }

    /// Mark a refresh as running when the fetch happens elsewhere (e.g. a
    /// background task using a clone of `source()`).
    pub fn begin_refresh(&mut self) {
        self.inventory.begin_refresh();
    }

    /// Apply the result of a fetch started with `begin_refresh`.
    pub fn apply_refresh(&mut self, result: Result<Vec<Product>, FetchError>) -> CacheState {
        self.inventory.apply_fetch(result)
    }

    pub fn is_refreshing(&self) -> bool {
        self.inventory.is_loading()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Search the active snapshot. A single match is recorded to history.
    pub fn lookup(&mut self, raw_query: &str) -> LookupOutcome {
        let matches: Vec<Product> = lookup::search(
            self.inventory.products(),
            raw_query,
            self.min_partial_query_len,
        )
        .into_iter()
        .cloned()
        .collect();

        let recorded_to_history = match matches.as_slice() {
            [only] => self.history.append(only),
            _ => false,
        };

        debug!(matches = matches.len(), recorded = recorded_to_history, "Lookup finished");
        LookupOutcome {
            matches,
            recorded_to_history,
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("History cleared");
    }

    pub fn status(&self) -> CacheStatus {
        self.inventory.status()
    }

    pub fn history(&self) -> &[Product] {
        self.history.entries()
    }

    /// Non-fatal persistence problems to show in a banner.
    pub fn warnings(&self) -> Vec<String> {
        self.inventory
            .status()
            .warning
            .into_iter()
            .chain(self.history.warning().map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{Origin, UNAVAILABLE_MESSAGE};
    use crate::remote::fake::FakeSource;
    use crate::store::{self, FileStore, MemoryStore, SNAPSHOT_AS_OF_KEY, SNAPSHOT_KEY};

    fn red_pen() -> Vec<Product> {
        vec![Product::new("A1", "Red Pen", "120", "100")]
    }

    fn book(source: FakeSource, store: Arc<MemoryStore>) -> PriceBook<FakeSource> {
        PriceBook::new(source, store, &Config::default())
    }

    #[tokio::test]
    async fn test_exact_code_match_is_recorded() {
        let mut book = book(FakeSource::online(red_pen()), Arc::new(MemoryStore::new()));
        assert_eq!(book.initialize().await, CacheState::Live);

        let outcome = book.lookup("a1");

        assert_eq!(outcome.matches, red_pen());
        assert!(outcome.recorded_to_history);
        assert_eq!(book.history(), red_pen().as_slice());
    }

    #[tokio::test]
    async fn test_short_description_query_finds_nothing() {
        let mut book = book(FakeSource::online(red_pen()), Arc::new(MemoryStore::new()));
        book.initialize().await;

        let outcome = book.lookup("pen");

        assert!(outcome.matches.is_empty());
        assert!(!outcome.recorded_to_history);
        assert!(book.history().is_empty());
    }

    #[tokio::test]
    async fn test_non_substring_long_query_finds_nothing() {
        let mut book = book(FakeSource::online(red_pen()), Arc::new(MemoryStore::new()));
        book.initialize().await;

        assert!(book.lookup("red pen case").matches.is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_touches_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut book = book(FakeSource::online(red_pen()), store.clone());
        book.initialize().await;

        let outcome = book.lookup("   ");

        assert!(outcome.matches.is_empty());
        assert!(!outcome.recorded_to_history);
        assert!(store.get(crate::store::HISTORY_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_multiple_matches_are_not_recorded() {
        let products = vec![
            Product::new("A1", "Red Pen", "120", "100"),
            Product::new("B2", "Blue Pen", "130", "110"),
            Product::new("C3", "Red Pencil", "90", "80"),
        ];
        let mut book = book(FakeSource::online(products), Arc::new(MemoryStore::new()));
        book.initialize().await;

        assert_eq!(book.lookup(" pen").matches.len(), 0);

        let single = book.lookup("e pen");
        assert_eq!(single.matches.len(), 1);
        assert!(single.recorded_to_history);

        let several = book.lookup("d pen");
        assert_eq!(several.matches.len(), 2);
        assert!(!several.recorded_to_history);
        assert_eq!(book.history().len(), 1);
        assert_eq!(book.history()[0].code, "B2");
    }

    #[tokio::test]
    async fn test_repeat_scan_not_recorded_twice() {
        let mut book = book(FakeSource::online(red_pen()), Arc::new(MemoryStore::new()));
        book.initialize().await;

        assert!(book.lookup("A1").recorded_to_history);
        let again = book.lookup("a1");
        assert_eq!(again.matches.len(), 1);
        assert!(!again.recorded_to_history);
    }

    #[tokio::test]
    async fn test_offline_with_saved_snapshot() {
        let store = Arc::new(MemoryStore::new());
        store::save_json(store.as_ref(), SNAPSHOT_KEY, &red_pen()).unwrap();
        store::save_json(store.as_ref(), SNAPSHOT_AS_OF_KEY, "2024-01-01").unwrap();
        let mut book = book(FakeSource::offline(), store);

        assert_eq!(book.initialize().await, CacheState::StaleCached);

        let status = book.status();
        assert_eq!(status.origin, Some(Origin::Cached));
        assert_eq!(
            status.as_of.map(|t| t.date_naive().to_string()).as_deref(),
            Some("2024-01-01")
        );
        assert_eq!(book.lookup("A1").matches.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_without_saved_snapshot() {
        let mut book = book(FakeSource::offline(), Arc::new(MemoryStore::new()));

        assert_eq!(book.initialize().await, CacheState::Unavailable);
        assert_eq!(book.status().blocking_message(), Some(UNAVAILABLE_MESSAGE));

        let outcome = book.lookup("A1");
        assert!(outcome.matches.is_empty());
        assert!(!outcome.recorded_to_history);
    }

    #[tokio::test]
    async fn test_clear_history_twice() {
        let store = Arc::new(MemoryStore::new());
        let mut book = book(FakeSource::online(red_pen()), store.clone());
        book.initialize().await;
        book.lookup("A1");

        for _ in 0..2 {
            book.clear_history();
            assert!(book.history().is_empty());
            assert_eq!(store.get(crate::store::HISTORY_KEY).unwrap().as_deref(), Some("[]"));
        }
    }

    #[tokio::test]
    async fn test_state_survives_restart_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let store = Arc::new(FileStore::new(dir.path().to_path_buf()).unwrap());
            let mut book = PriceBook::new(FakeSource::online(red_pen()), store, &Config::default());
            book.initialize().await;
            book.lookup("A1");
        }

        let store = Arc::new(FileStore::new(dir.path().to_path_buf()).unwrap());
        let mut book = PriceBook::new(FakeSource::offline(), store, &Config::default());

        assert_eq!(book.initialize().await, CacheState::StaleCached);
        assert_eq!(book.history(), red_pen().as_slice());
        assert_eq!(book.lookup("a1").matches, red_pen());
    }

    #[tokio::test]
    async fn test_apply_refresh_from_background_fetch() {
        let mut book = book(FakeSource::offline(), Arc::new(MemoryStore::new()));
        book.initialize().await;

        book.begin_refresh();
        assert!(book.is_refreshing());
        let result = book.source().fetch_dataset().await;
        assert_eq!(book.apply_refresh(result), CacheState::Unavailable);

        book.begin_refresh();
        assert_eq!(book.apply_refresh(Ok(red_pen())), CacheState::Live);
        assert!(!book.is_refreshing());
    }

    #[tokio::test]
    async fn test_warnings_collects_both_sources() {
        let store = Arc::new(MemoryStore::with_quota(10));
        let mut book = book(FakeSource::online(red_pen()), store);
        book.initialize().await;
        book.lookup("A1");

        let warnings = book.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("Offline copy not saved"));
        assert!(warnings[1].starts_with("History not saved"));
    }
}
