//! Application state management for the Preciario TUI.
//!
//! This module contains the `App` struct that holds the UI state and the
//! session's `PriceBook`, and coordinates the background sheet refresh.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use preciario_core::{
    CacheState, Config, DatasetSource, FetchError, FileStore, PriceBook, Product, SheetClient,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Only one refresh runs at a time, so a handful of slots is plenty.
const CHANNEL_BUFFER_SIZE: usize = 4;

/// Maximum length for the search input.
/// Barcodes and typed names both fit comfortably in 64 characters.
const MAX_QUERY_LENGTH: usize = 64;

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingClearHistory,
    Quitting,
}

/// What the results panel is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultView {
    /// Nothing searched yet this session.
    Idle,
    /// Matches for the last submitted query (possibly none).
    Search { query: String, matches: Vec<Product> },
    /// A history entry picked from the side panel.
    History(Product),
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from the background refresh task to the UI loop.
enum RefreshResult {
    /// The sheet fetch finished, successfully or not
    Dataset(Result<Vec<Product>, FetchError>),
}

/// Open the local store in the configured data directory.
pub fn open_store(config: &Config) -> Result<FileStore> {
    let data_dir = config.data_dir()?;
    debug!(?data_dir, "Data directory configured");

    Ok(FileStore::new(data_dir)
        .context("Failed to open data directory")?
        .with_quota(config.store_quota_bytes))
}

/// Build the session's price book from configuration.
pub fn open_price_book(config: &Config) -> Result<PriceBook<SheetClient>> {
    let store = open_store(config)?;
    let source = SheetClient::new(config.sheet_url.clone(), config.request_timeout())
        .context("Failed to build HTTP client")?;

    Ok(PriceBook::new(source, Arc::new(store), config))
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub book: PriceBook<SheetClient>,

    // UI State
    pub state: AppState,
    pub search_input: String,
    pub result_view: ResultView,
    pub history_selection: Option<usize>,

    // Background task channel
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    pub fn new(book: PriceBook<SheetClient>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            book,
            state: AppState::Normal,
            search_input: String::new(),
            result_view: ResultView::Idle,
            history_selection: None,
            refresh_rx: rx,
            refresh_tx: tx,
            status_message: None,
        }
    }

    /// Restore history and kick off the first fetch.
    pub fn start(&mut self) {
        self.book.restore_history();
        self.refresh_background();
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    /// Spawn a background task to fetch the sheet.
    /// Ignored while a fetch is already running, so a slow earlier response
    /// can never overwrite a later one.
    pub fn refresh_background(&mut self) {
        if self.book.is_refreshing() {
            debug!("Refresh already in flight, ignoring request");
            self.status_message = Some("Already updating...".to_string());
            return;
        }

        info!("Starting background refresh of price list");
        self.book.begin_refresh();

        let source = self.book.source().clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            let result = source.fetch_dataset().await;
            Self::send_result(&tx, RefreshResult::Dataset(result)).await;
        });

        self.status_message = Some("Updating price list...".to_string());
    }

    /// Helper to send refresh results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.refresh_rx.try_recv() {
            self.process_refresh_result(result);
        }
    }

    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Dataset(fetched) => {
                let state = self.book.apply_refresh(fetched);
                let status = self.book.status();
                self.status_message = match state {
                    CacheState::Live => Some(format!(
                        "Price list updated ({} items)",
                        status.product_count
                    )),
                    CacheState::StaleCached => {
                        Some("Offline - showing saved prices".to_string())
                    }
                    _ => None,
                };
                if let Some(warning) = status.warning {
                    warn!(warning = %warning, "Refresh finished with a persistence warning");
                }
            }
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Accept a typed or scanned character into the search box.
    pub fn push_char(&mut self, c: char) {
        if can_add_query_char(self.search_input.chars().count(), c) {
            self.search_input.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        self.search_input.pop();
    }

    /// Run the typed query. The box is cleared for the next scan either way.
    pub fn submit_search(&mut self) {
        let query = std::mem::take(&mut self.search_input);
        let trimmed = query.trim();

        if trimmed.is_empty() {
            if let Some(entry) = self.selected_history_entry().cloned() {
                self.result_view = ResultView::History(entry);
            }
            return;
        }

        let outcome = self.book.lookup(trimmed);
        debug!(
            matches = outcome.matches.len(),
            recorded = outcome.recorded_to_history,
            "Search submitted"
        );
        if outcome.recorded_to_history {
            self.history_selection = None;
        }
        self.status_message = None;
        self.result_view = ResultView::Search {
            query: trimmed.to_string(),
            matches: outcome.matches,
        };
    }

    /// Esc: clear the input, or the results when the input is already empty.
    pub fn clear_input(&mut self) {
        if self.search_input.is_empty() {
            self.result_view = ResultView::Idle;
            self.history_selection = None;
        } else {
            self.search_input.clear();
        }
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn selected_history_entry(&self) -> Option<&Product> {
        self.history_selection.and_then(|i| self.book.history().get(i))
    }

    pub fn select_history_next(&mut self) {
        let len = self.book.history().len();
        if len == 0 {
            return;
        }
        self.history_selection = Some(match self.history_selection {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        });
    }

    pub fn select_history_prev(&mut self) {
        self.history_selection = match self.history_selection {
            Some(0) | None => None,
            Some(i) => Some(i - 1),
        };
    }

    pub fn request_clear_history(&mut self) {
        if self.book.history().is_empty() {
            self.status_message = Some("History is already empty".to_string());
            return;
        }
        self.state = AppState::ConfirmingClearHistory;
    }

    pub fn confirm_clear_history(&mut self) {
        self.book.clear_history();
        self.history_selection = None;
        if matches!(self.result_view, ResultView::History(_)) {
            self.result_view = ResultView::Idle;
        }
        self.status_message = Some("History cleared".to_string());
        self.state = AppState::Normal;
    }

    /// True when there is no price list at all and no fetch is running.
    pub fn is_blocked(&self) -> bool {
        self.book.status().state == CacheState::Unavailable
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a search character should be accepted (no control characters)
pub fn can_add_query_char(current_len: usize, c: char) -> bool {
    current_len < MAX_QUERY_LENGTH && !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use preciario_core::MemoryStore;

    fn app_with(products: Vec<Product>) -> App {
        // Unroutable URL; tests feed fetch results in directly
        let source =
            SheetClient::new("http://127.0.0.1:9/sheet.csv", Duration::from_millis(50)).unwrap();
        let mut book = PriceBook::new(source, Arc::new(MemoryStore::new()), &Config::default());
        book.begin_refresh();
        book.apply_refresh(Ok(products));
        App::new(book)
    }

    fn catalog() -> Vec<Product> {
        vec![
            Product::new("A1", "Red Pen", "120", "100"),
            Product::new("B2", "Blue Pen", "130", "110"),
        ]
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.push_char(c);
        }
    }

    #[test]
    fn test_submit_clears_input_and_shows_matches() {
        let mut app = app_with(catalog());
        type_str(&mut app, "a1");
        app.submit_search();

        assert!(app.search_input.is_empty());
        match &app.result_view {
            ResultView::Search { query, matches } => {
                assert_eq!(query, "a1");
                assert_eq!(matches.len(), 1);
            }
            other => panic!("unexpected view: {other:?}"),
        }
        assert_eq!(app.book.history().len(), 1);
    }

    #[test]
    fn test_blank_submit_does_nothing() {
        let mut app = app_with(catalog());
        type_str(&mut app, "   ");
        app.submit_search();

        assert_eq!(app.result_view, ResultView::Idle);
        assert!(app.book.history().is_empty());
    }

    #[test]
    fn test_blank_submit_redisplays_selected_history() {
        let mut app = app_with(catalog());
        type_str(&mut app, "A1");
        app.submit_search();
        type_str(&mut app, "B2");
        app.submit_search();

        app.select_history_next();
        app.select_history_next();
        app.submit_search();

        assert_eq!(app.result_view, ResultView::History(catalog()[0].clone()));
        assert_eq!(app.book.history().len(), 2);
    }

    #[test]
    fn test_history_selection_bounds() {
        let mut app = app_with(catalog());
        app.select_history_next();
        assert_eq!(app.history_selection, None);

        type_str(&mut app, "A1");
        app.submit_search();
        app.select_history_next();
        app.select_history_next();
        assert_eq!(app.history_selection, Some(0));
        app.select_history_prev();
        assert_eq!(app.history_selection, None);
    }

    #[test]
    fn test_clear_history_flow() {
        let mut app = app_with(catalog());
        app.request_clear_history();
        assert_eq!(app.state, AppState::Normal);

        type_str(&mut app, "A1");
        app.submit_search();
        app.request_clear_history();
        assert_eq!(app.state, AppState::ConfirmingClearHistory);

        app.confirm_clear_history();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.book.history().is_empty());
    }

    #[test]
    fn test_escape_clears_input_then_results() {
        let mut app = app_with(catalog());
        type_str(&mut app, "A1");
        app.submit_search();
        type_str(&mut app, "B");

        app.clear_input();
        assert!(app.search_input.is_empty());
        assert!(matches!(app.result_view, ResultView::Search { .. }));

        app.clear_input();
        assert_eq!(app.result_view, ResultView::Idle);
    }

    #[tokio::test]
    async fn test_second_refresh_ignored_while_in_flight() {
        let mut app = app_with(catalog());
        app.refresh_background();
        assert!(app.book.is_refreshing());

        app.refresh_background();
        assert_eq!(app.status_message.as_deref(), Some("Already updating..."));
    }

    #[test]
    fn test_can_add_query_char() {
        assert!(can_add_query_char(0, 'a'));
        assert!(can_add_query_char(63, '7'));
        assert!(!can_add_query_char(64, 'a'));
        assert!(!can_add_query_char(0, '\n'));
        assert!(!can_add_query_char(0, '\x1b'));
    }
}
