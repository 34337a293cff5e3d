//! Preciario core - price sheet sync, offline cache, lookup and history.
//!
//! This crate contains everything a price-check front end needs:
//! - `remote`: download and parse the published sheet
//! - `store`: local persistence of the snapshot and history
//! - `inventory`: the live / saved / unavailable cache state machine
//! - `lookup`: exact code and partial description search
//! - `history`: bounded history of single-match lookups
//! - `book`: the `PriceBook` facade tying them together
//! - `config`: configuration and data directory

pub mod book;
pub mod config;
pub mod history;
pub mod inventory;
pub mod lookup;
pub mod models;
pub mod remote;
pub mod store;
pub mod utils;

pub use book::{LookupOutcome, PriceBook};
pub use config::Config;
pub use inventory::{CacheState, CacheStatus, Origin, Snapshot};
pub use models::Product;
pub use remote::{DatasetSource, FetchError, SheetClient};
pub use store::{FileStore, MemoryStore, Store, StoreError};
