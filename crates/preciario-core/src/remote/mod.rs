//! Remote source for the price sheet.
//!
//! This module provides the `SheetClient` for downloading the published
//! CSV export, and the `DatasetSource` trait the inventory cache refreshes
//! from. Failures are reported as `FetchError`; retry policy belongs to the
//! caller.

pub mod client;
pub mod error;

pub use client::{parse_table, DatasetSource, SheetClient};
pub use error::FetchError;
