use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::models::Product;
use crate::remote::{DatasetSource, FetchError};
use crate::store::{self, Store, StoreError, SNAPSHOT_AS_OF_KEY, SNAPSHOT_KEY};
use crate::utils::format_age;

/// Blocking message shown when no price list can be loaded.
pub const UNAVAILABLE_MESSAGE: &str =
    "Price list unavailable: the sheet could not be reached and no saved copy exists.";

/// Where the active snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Live,
    Cached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Loading,
    Live,
    StaleCached,
    Unavailable,
}

/// An immutable copy of the price list.
/// Replaced wholesale on refresh, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    products: Vec<Product>,
    origin: Origin,
    /// When this list was fetched from the sheet, not when it was loaded.
    as_of: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(products: Vec<Product>, origin: Origin, as_of: Option<DateTime<Utc>>) -> Self {
        Self {
            products,
            origin,
            as_of,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        self.as_of
    }

    pub fn age_display(&self) -> Option<String> {
        self.as_of.map(|t| format_age((Utc::now() - t).num_minutes()))
    }
}

/// Point-in-time view of the cache for status indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub state: CacheState,
    pub origin: Option<Origin>,
    pub as_of: Option<DateTime<Utc>>,
    pub product_count: usize,
    /// Why the last refresh failed, if it did.
    pub last_error: Option<String>,
    /// Non-fatal: the last snapshot could not be saved for offline use.
    pub warning: Option<String>,
}

impl CacheStatus {
    pub fn blocking_message(&self) -> Option<&'static str> {
        (self.state == CacheState::Unavailable).then_some(UNAVAILABLE_MESSAGE)
    }
}

pub struct InventoryCache {
    store: Arc<dyn Store>,
    snapshot: Option<Arc<Snapshot>>,
    state: CacheState,
    last_error: Option<String>,
    warning: Option<String>,
}

impl InventoryCache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            snapshot: None,
            state: CacheState::Uninitialized,
            last_error: None,
            warning: None,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == CacheState::Loading
    }

    /// The active snapshot. Holders keep their copy across later refreshes.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.clone()
    }

    /// Products of the active snapshot; empty when nothing is loaded.
    pub fn products(&self) -> &[Product] {
        self.snapshot.as_deref().map(Snapshot::products).unwrap_or(&[])
    }

    pub fn status(&self) -> CacheStatus {
        CacheStatus {
            state: self.state,
            origin: self.snapshot.as_ref().map(|s| s.origin),
            as_of: self.snapshot.as_ref().and_then(|s| s.as_of),
            product_count: self.products().len(),
            last_error: self.last_error.clone(),
            warning: self.warning.clone(),
        }
    }

    /// Mark a fetch as started. The current snapshot stays readable.
    pub fn begin_refresh(&mut self) {
        debug!(from = ?self.state, "Refresh started");
        self.state = CacheState::Loading;
    }

    /// Fetch from `source` and apply the outcome.
    pub async fn refresh<S: DatasetSource>(&mut self, source: &S) -> CacheState {
        self.begin_refresh();
        let result = source.fetch_dataset().await;
        self.apply_fetch(result)
    }

    /// Resolve a finished fetch into `Live`, `StaleCached` or `Unavailable`.
    pub fn apply_fetch(&mut self, result: Result<Vec<Product>, FetchError>) -> CacheState {
        match result {
            Ok(products) => self.install_live(products),
            Err(e) => self.fall_back(e),
        }
        self.state
    }

    fn install_live(&mut self, products: Vec<Product>) {
        let as_of = Utc::now();
        info!(count = products.len(), "Sheet fetched, snapshot is live");

        self.warning = match self.persist(&products, as_of) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Failed to save snapshot for offline use");
                Some(format!("Offline copy not saved: {}", e))
            }
        };

        self.snapshot = Some(Arc::new(Snapshot::new(products, Origin::Live, Some(as_of))));
        self.last_error = None;
        self.state = CacheState::Live;
    }

    fn fall_back(&mut self, error: FetchError) {
        warn!(error = %error, "Sheet fetch failed, falling back to saved copy");
        self.last_error = Some(error.to_string());

        let stored = self.load_stored();

        // Keep whichever copy is newer; ties keep the one in memory
        let keep_current = match (&self.snapshot, &stored) {
            (Some(current), Some(stored)) => current.as_of >= stored.as_of,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if keep_current {
            if let Some(current) = self.snapshot.take() {
                let stale = match current.origin {
                    Origin::Cached => current,
                    Origin::Live => Arc::new(Snapshot::new(
                        current.products.clone(),
                        Origin::Cached,
                        current.as_of,
                    )),
                };
                info!(count = stale.products.len(), "Keeping in-memory snapshot");
                self.snapshot = Some(stale);
                self.state = CacheState::StaleCached;
                return;
            }
        }

        if let Some(stored) = stored {
            info!(count = stored.products.len(), as_of = ?stored.as_of, "Using saved snapshot");
            self.snapshot = Some(Arc::new(stored));
            self.state = CacheState::StaleCached;
            return;
        }

        warn!("No saved snapshot, price list unavailable");
        self.state = CacheState::Unavailable;
    }

    fn persist(&self, products: &[Product], as_of: DateTime<Utc>) -> Result<(), StoreError> {
        let store = self.store.as_ref();
        store::save_json(store, SNAPSHOT_KEY, products)?;
        if let Err(e) = store::save_json(store, SNAPSHOT_AS_OF_KEY, &as_of.to_rfc3339()) {
            // An older timestamp would mislabel the new snapshot
            let _ = store.remove(SNAPSHOT_AS_OF_KEY);
            return Err(e);
        }
        Ok(())
    }

    fn load_stored(&self) -> Option<Snapshot> {
        let products = match store::load_json::<Vec<Product>>(self.store.as_ref(), SNAPSHOT_KEY) {
            Ok(Some(products)) => products,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Saved snapshot unreadable, ignoring it");
                return None;
            }
        };
        Some(Snapshot::new(products, Origin::Cached, self.load_as_of()))
    }

    fn load_as_of(&self) -> Option<DateTime<Utc>> {
        let raw = match self.store.get(SNAPSHOT_AS_OF_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read snapshot timestamp");
                return None;
            }
        };
        let text = serde_json::from_str::<String>(&raw).unwrap_or(raw);
        let parsed = parse_timestamp(&text);
        if parsed.is_none() {
            warn!(value = %text, "Unrecognized snapshot timestamp");
        }
        parsed
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
