//! Non-interactive commands: one-shot lookup and cache status.

use anyhow::{bail, Result};

use preciario_core::utils::format_age;
use preciario_core::{CacheState, CacheStatus, Config, Product, Store};

use crate::app::{open_price_book, open_store};

/// Fetch (or fall back), run one query and print the matches.
pub async fn run_lookup(config: &Config, query: &str) -> Result<()> {
    let mut book = open_price_book(config)?;
    book.initialize().await;
    let status = book.status();
    eprintln!("{}", status_line(&status));

    if let Some(message) = status.blocking_message() {
        bail!("{}", message);
    }

    let outcome = book.lookup(query);
    if outcome.matches.is_empty() {
        println!("No products found for \"{}\".", query.trim());
    }
    for product in &outcome.matches {
        println!("{}", product_block(product));
    }
    for warning in book.warnings() {
        eprintln!("Warning: {}", warning);
    }
    Ok(())
}

/// Fetch (or fall back) and report where the prices came from.
pub async fn run_status(config: &Config) -> Result<()> {
    let mut book = open_price_book(config)?;
    book.initialize().await;
    let status = book.status();

    println!("{}", status_line(&status));
    println!("Sheet:    {}", book.source().url());
    println!("Data dir: {}", config.data_dir()?.display());
    println!("History:  {} entries", book.history().len());
    if let Some(ref e) = status.last_error {
        println!("Last fetch error: {}", e);
    }
    for warning in book.warnings() {
        println!("Warning: {}", warning);
    }
    Ok(())
}

/// Delete the saved price list and the history.
pub fn run_reset(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    store.clear()?;
    println!("Cleared saved prices and history in {}", store.dir().display());
    Ok(())
}

pub fn status_line(status: &CacheStatus) -> String {
    match status.state {
        CacheState::Live => format!("Live: {} products", status.product_count),
        CacheState::StaleCached => match status.as_of {
            Some(t) => format!(
                "Offline: {} saved products as of {} ({})",
                status.product_count,
                t.format("%Y-%m-%d %H:%M UTC"),
                format_age((chrono::Utc::now() - t).num_minutes())
            ),
            None => format!(
                "Offline: {} saved products, date unknown",
                status.product_count
            ),
        },
        CacheState::Unavailable => "Unavailable: no price list".to_string(),
        CacheState::Loading => "Loading".to_string(),
        CacheState::Uninitialized => "Not loaded".to_string(),
    }
}

fn product_block(product: &Product) -> String {
    format!(
        "{}\n  Code:   {}\n  Credit: {}\n  Cash:   {}",
        product.display_name(),
        product.code,
        product.credit_display(),
        product.cash_display()
    )
}
