//! Code and description search over the active snapshot.
//!
//! A record matches when its code equals the query, or, for queries of at
//! least `min_partial_len` characters, when its description contains the
//! query. Both sides are case-folded. Results keep dataset order.

use crate::models::Product;

/// Trim and case-fold a raw operator query.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Search `products` for `raw_query`. An empty or whitespace-only query
/// matches nothing.
pub fn search<'a>(
    products: &'a [Product],
    raw_query: &str,
    min_partial_len: usize,
) -> Vec<&'a Product> {
    let query = normalize_query(raw_query);
    if query.is_empty() {
        return Vec::new();
    }

    let partial = query.chars().count() >= min_partial_len;

    products
        .iter()
        .filter(|product| {
            product.code.to_lowercase() == query
                || (partial && product.description.to_lowercase().contains(&query))
        })
        .collect()
}
