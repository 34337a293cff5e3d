//! Offline-resilient inventory cache.
//!
//! This module provides the `InventoryCache`, which owns the active price
//! list and where it came from. A refresh either installs a freshly fetched
//! list (and saves it for next time), falls back to the last saved list, or
//! ends up with nothing at all:
//!
//! - `Live`: the sheet was fetched this session
//! - `StaleCached`: the fetch failed, a saved copy is in use
//! - `Unavailable`: the fetch failed and nothing was saved

pub mod cache;

pub use cache::{CacheState, CacheStatus, InventoryCache, Origin, Snapshot, UNAVAILABLE_MESSAGE};
