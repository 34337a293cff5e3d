use serde::{Deserialize, Serialize};

use crate::utils::format_price;

/// Sheet column holding the product code.
pub const CODE_COLUMN: &str = "Codigo";
pub const DESCRIPTION_COLUMN: &str = "Descripcion";
pub const CREDIT_COLUMN: &str = "Credito";
pub const CASH_COLUMN: &str = "Efectivo";

/// Shown in place of an empty description.
const UNNAMED_PRODUCT: &str = "Unnamed item";

/// A single row of the published price sheet.
///
/// Field names in the persisted snapshot are the sheet's column headers, so
/// a stored blob reads like the export it came from. Missing fields read as
/// empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "Codigo", default)]
    pub code: String,
    #[serde(rename = "Descripcion", default)]
    pub description: String,
    /// List / card price, exactly as the sheet spells it.
    #[serde(rename = "Credito", default)]
    pub credit_price: String,
    /// Cash price, exactly as the sheet spells it.
    #[serde(rename = "Efectivo", default)]
    pub cash_price: String,
}

impl Product {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        credit_price: impl Into<String>,
        cash_price: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            credit_price: credit_price.into(),
            cash_price: cash_price.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.description.trim().is_empty() {
            UNNAMED_PRODUCT
        } else {
            &self.description
        }
    }

    pub fn credit_display(&self) -> String {
        format_price(&self.credit_price)
    }

    pub fn cash_display(&self) -> String {
        format_price(&self.cash_price)
    }

    /// A row with nothing in any of the four fields carries no information.
    pub fn is_blank(&self) -> bool {
        self.code.is_empty()
            && self.description.is_empty()
            && self.credit_price.is_empty()
            && self.cash_price.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_sheet_headers() {
        let product = Product::new("A1", "Red Pen", "120", "100");
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["Codigo"], "A1");
        assert_eq!(json["Descripcion"], "Red Pen");
        assert_eq!(json["Credito"], "120");
        assert_eq!(json["Efectivo"], "100");
    }

    #[test]
    fn test_missing_columns_default_to_empty() {
        let product: Product = serde_json::from_str(r#"{"Codigo":"B2","Extra":"x"}"#).unwrap();
        assert_eq!(product.code, "B2");
        assert_eq!(product.description, "");
        assert_eq!(product.cash_price, "");
    }

    #[test]
    fn test_display_name_placeholder() {
        assert_eq!(Product::new("C3", "  ", "1", "1").display_name(), UNNAMED_PRODUCT);
        assert_eq!(Product::new("C3", "Glue", "1", "1").display_name(), "Glue");
    }

    #[test]
    fn test_is_blank() {
        assert!(Product::default().is_blank());
        assert!(!Product::new("", "", "", "5").is_blank());
    }
}
