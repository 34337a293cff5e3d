//! HTTP client for the published price sheet.
//!
//! The sheet is exported as CSV: a header row naming the columns, then one
//! product per row. `SheetClient` downloads it and `parse_table` turns it
//! into `Product`s.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::models::product::{Product, CASH_COLUMN, CODE_COLUMN, CREDIT_COLUMN, DESCRIPTION_COLUMN};

use super::FetchError;

/// Anything that can produce a fresh copy of the dataset.
pub trait DatasetSource: Send + Sync {
    fn fetch_dataset(&self) -> impl Future<Output = Result<Vec<Product>, FetchError>> + Send;
}

/// Client for the sheet export URL.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct SheetClient {
    client: Client,
    url: String,
}

impl SheetClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download and parse the export at `url`. No retries.
    pub async fn fetch(&self, url: &str) -> Result<Vec<Product>, FetchError> {
        debug!(url = url, "Fetching sheet export");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status, &body));
        }

        let body = response.text().await?;
        let products = parse_table(&body)?;
        info!(count = products.len(), bytes = body.len(), "Sheet export parsed");
        Ok(products)
    }
}

impl DatasetSource for SheetClient {
    fn fetch_dataset(&self) -> impl Future<Output = Result<Vec<Product>, FetchError>> + Send {
        self.fetch(self.url())
    }
}

/// Parse a CSV export into products, in sheet order.
///
/// Fields and headers are trimmed, short or long rows are tolerated, and rows
/// with every field empty are skipped. A payload with no header row is an
/// empty sheet; a header row without the code column is rejected.
pub fn parse_table(payload: &str) -> Result<Vec<Product>, FetchError> {
    let payload = payload.strip_prefix('\u{feff}').unwrap_or(payload);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(payload.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    // First column with a matching header wins
    let column = |name: &str| headers.iter().position(|h| h == name);
    let code = column(CODE_COLUMN).ok_or(FetchError::MissingColumn(CODE_COLUMN))?;
    let description = column(DESCRIPTION_COLUMN);
    let credit = column(CREDIT_COLUMN);
    let cash = column(CASH_COLUMN);

    let mut products = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        let product = Product {
            code: field(Some(code)),
            description: field(description),
            credit_price: field(credit),
            cash_price: field(cash),
        };
        if !product.is_blank() {
            products.push(product);
        }
    }
    Ok(products)
}
