//! Data models for the price list.
//!
//! - `Product`: one row of the published sheet (code, name, two prices)

pub mod product;

pub use product::Product;
