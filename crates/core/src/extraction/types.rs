//! Wire shapes returned by the extraction service.
//!
//! Every field is optional. Amounts arrive as numbers, numeric strings or
//! formatted strings such as `"$1,250.00"`; anything unparseable decodes as
//! `None` instead of failing the whole result.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One extracted line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedItem {
    /// Line item name.
    pub name: Option<String>,
    /// Amount, when one could be read.
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: Option<Decimal>,
    /// Category the service thinks this belongs to.
    pub suggested_category: Option<String>,
    /// Mini-pool the service thinks this belongs to.
    pub suggested_mini_pool: Option<String>,
    /// Service's explanation for the suggestion.
    pub reason: Option<String>,
    /// Whether the document shows the money as already spent.
    pub spent: Option<bool>,
    /// Vendor or payee.
    pub vendor: Option<String>,
    /// Date as printed on the document.
    pub date: Option<String>,
}

/// A titled group of items (grouped documents such as multi-aim budgets).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedGroup {
    /// Group heading.
    pub name: Option<String>,
    /// Sub-heading.
    pub subtitle: Option<String>,
    /// Items in the group.
    pub items: Vec<ExtractedItem>,
}

/// Result of extracting a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionResult {
    /// Document type slug (e.g. "invoice", "budget_justification").
    pub document_type: Option<String>,
    /// Grant title printed on the document.
    pub grant_title: Option<String>,
    /// Service's own call on whether the document is grouped.
    #[serde(rename = "isGrouped")]
    pub grouped: Option<bool>,
    /// Category the service suggests for the whole document.
    pub suggested_category: Option<String>,
    /// Total stated on the document.
    #[serde(deserialize_with = "lenient_amount")]
    pub total_amount: Option<Decimal>,
    /// Flat items.
    pub items: Vec<ExtractedItem>,
    /// Grouped items. A non-empty list makes this a grouped result.
    pub groups: Vec<ExtractedGroup>,
}

impl ExtractionResult {
    /// Returns true when the document was extracted as groups.
    ///
    /// The service's `isGrouped` flag wins when the list it points at has
    /// entries; otherwise a non-empty group list makes the result grouped.
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        match self.grouped {
            Some(true) if !self.groups.is_empty() => true,
            Some(false) if !self.items.is_empty() => false,
            _ => !self.groups.is_empty(),
        }
    }
}

/// Parses a loosely formatted amount. Currency symbols, thousands separators
/// and whitespace are ignored; scientific notation is accepted.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '€' | '£') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => parse_amount(&n.to_string()),
        Some(Value::String(s)) => parse_amount(&s),
        _ => None,
    })
}
