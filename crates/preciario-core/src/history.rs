//! Bounded, persistent history of single-match lookups.
//!
//! Entries are most recent first and never exceed the cap. A lookup that
//! repeats the code at the head of the list is dropped; repeats further
//! down are kept. The full list is re-saved after every change.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::Product;
use crate::store::{self, Store, HISTORY_KEY};

pub struct HistoryLedger {
    store: Arc<dyn Store>,
    entries: Vec<Product>,
    cap: usize,
    /// Last persistence failure, cleared by the next successful save.
    warning: Option<String>,
}

/// Smallest usable cap; with zero every append would evict itself.
const MIN_CAP: usize = 1;

impl HistoryLedger {
    pub fn new(store: Arc<dyn Store>, cap: usize) -> Self {
        if cap < MIN_CAP {
            warn!(cap, "History cap too small, using {}", MIN_CAP);
        }
        Self {
            store,
            entries: Vec::new(),
            cap: cap.max(MIN_CAP),
            warning: None,
        }
    }

    /// Replace the in-memory list with the persisted one.
    /// Unreadable history starts empty rather than failing startup.
    pub fn restore(&mut self) {
        self.entries = match store::load_json::<Vec<Product>>(self.store.as_ref(), HISTORY_KEY) {
            Ok(Some(mut entries)) => {
                entries.truncate(self.cap);
                entries
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to restore history, starting empty");
                Vec::new()
            }
        };
        debug!(count = self.entries.len(), "History restored");
    }

    /// Record a lookup. Returns false when it repeats the newest entry.
    pub fn append(&mut self, product: &Product) -> bool {
        if self.entries.first().map(|head| head.code == product.code).unwrap_or(false) {
            debug!(code = %product.code, "Skipping consecutive duplicate");
            return false;
        }

        self.entries.insert(0, product.clone());
        self.entries.truncate(self.cap);
        self.persist();
        true
    }

    /// Empty the ledger and persist the empty list.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    pub fn entries(&self) -> &[Product] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    fn persist(&mut self) {
        match store::save_json(self.store.as_ref(), HISTORY_KEY, &self.entries) {
            Ok(()) => self.warning = None,
            Err(e) => {
                warn!(error = %e, "Failed to persist history");
                self.warning = Some(format!("History not saved: {}", e));
            }
        }
    }
}
