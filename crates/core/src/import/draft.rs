//! Reviewable staging area between an extraction result and the budget.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ImportError;
use crate::budget::ExpenseStatus;
use crate::extraction::{ExtractedItem, ExtractionResult};

/// Shape of an extracted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftLayout {
    /// A single list of line items.
    Flat,
    /// Items under titled groups.
    Grouped,
}

/// One reviewable line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    /// Line item name; becomes the expense description.
    pub name: String,
    /// Amount, if one was read or entered.
    pub amount: Option<Decimal>,
    /// Whether the row will be imported.
    pub selected: bool,
    /// Spent or planned.
    pub status: ExpenseStatus,
    /// Vendor.
    #[serde(default)]
    pub vendor: Option<String>,
    /// Date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Suggested category name.
    #[serde(default)]
    pub suggested_category: Option<String>,
    /// Suggested mini-pool description.
    #[serde(default)]
    pub suggested_mini_pool: Option<String>,
    /// Why the suggestion was made.
    #[serde(default)]
    pub reason: Option<String>,
}

impl ImportRow {
    fn from_item(item: ExtractedItem) -> Self {
        let selected = item.amount.is_some_and(|a| a > Decimal::ZERO);
        Self {
            name: item.name.map(|n| n.trim().to_string()).unwrap_or_default(),
            amount: item.amount,
            selected,
            status: ExpenseStatus::from_legacy_flag(item.spent),
            vendor: item.vendor.filter(|v| !v.trim().is_empty()),
            date: item.date.as_deref().and_then(parse_date),
            suggested_category: item.suggested_category.filter(|s| !s.trim().is_empty()),
            suggested_mini_pool: item.suggested_mini_pool.filter(|s| !s.trim().is_empty()),
            reason: item.reason,
        }
    }

    /// Amount counted toward selected totals.
    #[must_use]
    pub fn selected_amount(&self) -> Decimal {
        if self.selected {
            self.amount.unwrap_or_default()
        } else {
            Decimal::ZERO
        }
    }
}

/// A group of rows with its headings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportGroup {
    /// Group heading.
    pub name: String,
    /// Sub-heading.
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Rows in document order.
    pub rows: Vec<ImportRow>,
}

impl ImportGroup {
    /// Sum of the selected rows.
    #[must_use]
    pub fn selected_total(&self) -> Decimal {
        self.rows.iter().map(ImportRow::selected_amount).sum()
    }

    /// Returns true if at least one row is selected.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.rows.iter().any(|r| r.selected)
    }
}

/// Position of a row inside a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIndex {
    /// Group position; `None` addresses the flat row list.
    pub group: Option<usize>,
    /// Row position.
    pub row: usize,
}

/// Extracted rows awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDraft {
    /// Document layout.
    pub layout: DraftLayout,
    /// Document type slug.
    #[serde(default)]
    pub document_type: Option<String>,
    /// Grant title printed on the document.
    #[serde(default)]
    pub grant_title: Option<String>,
    /// Total stated on the document.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    /// Category suggested for the whole document.
    #[serde(default)]
    pub suggested_category: Option<String>,
    /// Rows of a flat document.
    #[serde(default)]
    pub rows: Vec<ImportRow>,
    /// Groups of a grouped document.
    #[serde(default)]
    pub groups: Vec<ImportGroup>,
}

impl ImportDraft {
    /// Stages an extraction result. Rows with a positive amount start selected.
    #[must_use]
    pub fn from_extraction(result: ExtractionResult) -> Self {
        let layout = if result.is_grouped() {
            DraftLayout::Grouped
        } else {
            DraftLayout::Flat
        };
        let source_groups = if layout == DraftLayout::Grouped {
            result.groups
        } else {
            Vec::new()
        };
        let groups = source_groups
            .into_iter()
            .enumerate()
            .map(|(i, group)| {
                let subtitle = group.subtitle.filter(|s| !s.trim().is_empty());
                let name = group
                    .name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .or_else(|| subtitle.clone())
                    .unwrap_or_else(|| format!("Group {}", i + 1));
                ImportGroup {
                    name,
                    subtitle,
                    rows: group.items.into_iter().map(ImportRow::from_item).collect(),
                }
            })
            .collect();

        Self {
            layout,
            document_type: result.document_type,
            grant_title: result.grant_title,
            total_amount: result.total_amount,
            suggested_category: result
                .suggested_category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            rows: if layout == DraftLayout::Flat {
                result.items.into_iter().map(ImportRow::from_item).collect()
            } else {
                Vec::new()
            },
            groups,
        }
    }

    /// Every row in document order.
    pub fn all_rows(&self) -> impl Iterator<Item = &ImportRow> {
        self.rows
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.rows.iter()))
    }

    /// Selected rows in document order.
    pub fn selected_rows(&self) -> impl Iterator<Item = &ImportRow> {
        self.all_rows().filter(|r| r.selected)
    }

    /// Sum of every selected row.
    #[must_use]
    pub fn selected_total(&self) -> Decimal {
        self.all_rows().map(ImportRow::selected_amount).sum()
    }

    /// Looks up a row for editing.
    pub fn row_mut(&mut self, index: RowIndex) -> Option<&mut ImportRow> {
        match index.group {
            None => self.rows.get_mut(index.row),
            Some(group) => self.groups.get_mut(group)?.rows.get_mut(index.row),
        }
    }

    /// Flips a row's selection.
    pub fn toggle(&mut self, index: RowIndex) -> Result<bool, ImportError> {
        let row = self.row_mut(index).ok_or(ImportError::RowNotFound(index))?;
        row.selected = !row.selected;
        Ok(row.selected)
    }

    /// Corrects a row's amount.
    pub fn set_amount(&mut self, index: RowIndex, amount: Decimal) -> Result<(), ImportError> {
        let row = self.row_mut(index).ok_or(ImportError::RowNotFound(index))?;
        row.amount = Some(amount);
        Ok(())
    }

    /// Changes a row's status.
    pub fn set_status(&mut self, index: RowIndex, status: ExpenseStatus) -> Result<(), ImportError> {
        let row = self.row_mut(index).ok_or(ImportError::RowNotFound(index))?;
        row.status = status;
        Ok(())
    }

    /// Checks the selection before anything is applied.
    ///
    /// # Errors
    ///
    /// `RowsOutsideLayout` when a flat draft carries groups or a grouped
    /// draft carries flat rows; `NothingSelected` when no row is selected;
    /// `InvalidRow` for the first selected row with a blank name or a missing
    /// or non-positive amount.
    pub fn validate_selection(&self) -> Result<(), ImportError> {
        let stray = match self.layout {
            DraftLayout::Flat => !self.groups.is_empty(),
            DraftLayout::Grouped => !self.rows.is_empty(),
        };
        if stray {
            return Err(ImportError::RowsOutsideLayout(self.layout));
        }
        let mut any = false;
        for (position, row) in self.all_rows().enumerate() {
            if !row.selected {
                continue;
            }
            any = true;
            if row.name.trim().is_empty() {
                return Err(ImportError::InvalidRow {
                    position: position + 1,
                    reason: "name is blank".into(),
                });
            }
            match row.amount {
                Some(amount) if amount > Decimal::ZERO => {}
                Some(amount) => {
                    return Err(ImportError::InvalidRow {
                        position: position + 1,
                        reason: format!("amount must be greater than zero, got {amount}"),
                    });
                }
                None => {
                    return Err(ImportError::InvalidRow {
                        position: position + 1,
                        reason: "amount is missing".into(),
                    });
                }
            }
        }
        if any {
            Ok(())
        } else {
            Err(ImportError::NothingSelected)
        }
    }

    /// Provenance note stamped on every imported expense.
    #[must_use]
    pub fn provenance_note(&self, grant_title: Option<&str>) -> String {
        provenance_note(self.document_type.as_deref(), grant_title)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Human label of a document type slug.
///
/// Known types have fixed labels, unknown ones are title-cased and an absent
/// type is "document".
#[must_use]
pub fn document_type_label(document_type: Option<&str>) -> String {
    let Some(slug) = document_type.map(str::trim).filter(|s| !s.is_empty()) else {
        return "document".to_string();
    };
    let known = match slug.to_lowercase().as_str() {
        "invoice" => Some("Invoice"),
        "receipt" => Some("Receipt"),
        "quote" | "quotation" => Some("Quote"),
        "purchase_order" | "purchase-order" => Some("Purchase Order"),
        "budget" => Some("Budget"),
        "budget_justification" | "budget-justification" => Some("Budget Justification"),
        "award_letter" | "award-letter" => Some("Award Letter"),
        "bank_statement" | "bank-statement" | "statement" => Some("Bank Statement"),
        "payroll" => Some("Payroll Report"),
        _ => None,
    };
    known.map_or_else(|| title_case(slug), str::to_string)
}

fn title_case(slug: &str) -> String {
    slug.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Imported from {label}", plus " — {grant title}" when one is known.
#[must_use]
pub fn provenance_note(document_type: Option<&str>, grant_title: Option<&str>) -> String {
    let label = document_type_label(document_type);
    match grant_title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("Imported from {label} — {title}"),
        None => format!("Imported from {label}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractedGroup;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn item(name: &str, amount: Option<Decimal>) -> ExtractedItem {
        ExtractedItem {
            name: Some(name.into()),
            amount,
            ..ExtractedItem::default()
        }
    }

    #[test]
    fn test_rows_with_positive_amount_start_selected() {
        let draft = ImportDraft::from_extraction(ExtractionResult {
            items: vec![
                item("Laptop", Some(dec!(900))),
                item("Free sample", Some(dec!(0))),
                item("Unknown", None),
            ],
            ..ExtractionResult::default()
        });

        assert_eq!(draft.layout, DraftLayout::Flat);
        let selected: Vec<bool> = draft.rows.iter().map(|r| r.selected).collect();
        assert_eq!(selected, vec![true, false, false]);
        assert_eq!(draft.selected_total(), dec!(900));
    }

    #[test]
    fn test_status_follows_explicit_flag() {
        let draft = ImportDraft::from_extraction(ExtractionResult {
            items: vec![
                ExtractedItem {
                    spent: Some(false),
                    ..item("Planned trip", Some(dec!(10)))
                },
                ExtractedItem {
                    spent: Some(true),
                    ..item("Paid trip", Some(dec!(10)))
                },
                item("No flag", Some(dec!(10))),
            ],
            ..ExtractionResult::default()
        });

        let statuses: Vec<ExpenseStatus> = draft.rows.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ExpenseStatus::Planned,
                ExpenseStatus::Spent,
                ExpenseStatus::Spent
            ]
        );
    }

    #[test]
    fn test_grouped_names_fall_back_to_subtitle_then_position() {
        let draft = ImportDraft::from_extraction(ExtractionResult {
            groups: vec![
                ExtractedGroup {
                    name: Some("Aim 1".into()),
                    subtitle: Some("Outreach".into()),
                    items: vec![item("Staff", Some(dec!(5)))],
                },
                ExtractedGroup {
                    name: None,
                    subtitle: Some("Training".into()),
                    items: vec![],
                },
                ExtractedGroup::default(),
            ],
            ..ExtractionResult::default()
        });

        assert_eq!(draft.layout, DraftLayout::Grouped);
        let names: Vec<&str> = draft.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Aim 1", "Training", "Group 3"]);
    }

    #[test]
    fn test_nothing_selected() {
        let mut draft = ImportDraft::from_extraction(ExtractionResult {
            items: vec![item("Laptop", Some(dec!(900)))],
            ..ExtractionResult::default()
        });
        draft.toggle(RowIndex { group: None, row: 0 }).unwrap();

        assert!(matches!(
            draft.validate_selection(),
            Err(ImportError::NothingSelected)
        ));
    }

    #[test]
    fn test_selected_row_with_bad_amount_is_invalid() {
        let mut draft = ImportDraft::from_extraction(ExtractionResult {
            items: vec![item("Laptop", Some(dec!(900))), item("Dock", None)],
            ..ExtractionResult::default()
        });
        let index = RowIndex { group: None, row: 1 };
        draft.toggle(index).unwrap();

        assert!(matches!(
            draft.validate_selection(),
            Err(ImportError::InvalidRow { position: 2, .. })
        ));

        draft.set_amount(index, dec!(-3)).unwrap();
        assert!(draft.validate_selection().is_err());

        draft.set_amount(index, dec!(45)).unwrap();
        assert!(draft.validate_selection().is_ok());
        assert_eq!(draft.selected_total(), dec!(945));
    }

    #[test]
    fn test_flat_draft_with_groups_is_rejected() {
        let mut draft = ImportDraft::from_extraction(ExtractionResult {
            items: vec![item("Monitor", Some(dec!(250)))],
            ..ExtractionResult::default()
        });
        draft.groups.push(ImportGroup {
            name: "Stray".into(),
            subtitle: None,
            rows: draft.rows.clone(),
        });

        assert!(matches!(
            draft.validate_selection(),
            Err(ImportError::RowsOutsideLayout(DraftLayout::Flat))
        ));
    }

    #[test]
    fn test_flat_extraction_drops_groups_and_keeps_document_suggestion() {
        let draft = ImportDraft::from_extraction(ExtractionResult {
            grouped: Some(false),
            suggested_category: Some("  Equipment ".into()),
            items: vec![item("Monitor", Some(dec!(250)))],
            groups: vec![ExtractedGroup {
                name: Some("Stray".into()),
                ..ExtractedGroup::default()
            }],
            ..ExtractionResult::default()
        });

        assert_eq!(draft.layout, DraftLayout::Flat);
        assert!(draft.groups.is_empty());
        assert_eq!(draft.suggested_category.as_deref(), Some("Equipment"));
        assert!(draft.validate_selection().is_ok());
    }

    #[test]
    fn test_unknown_row_index() {
        let mut draft = ImportDraft::from_extraction(ExtractionResult::default());
        assert!(matches!(
            draft.toggle(RowIndex {
                group: Some(3),
                row: 0
            }),
            Err(ImportError::RowNotFound(_))
        ));
    }

    #[rstest]
    #[case(Some("invoice"), "Invoice")]
    #[case(Some("budget_justification"), "Budget Justification")]
    #[case(Some("travel-claim"), "Travel Claim")]
    #[case(Some("  "), "document")]
    #[case(None, "document")]
    fn test_document_type_label(#[case] slug: Option<&str>, #[case] expected: &str) {
        assert_eq!(document_type_label(slug), expected);
    }

    #[test]
    fn test_provenance_note() {
        assert_eq!(
            provenance_note(Some("receipt"), None),
            "Imported from Receipt"
        );
        assert_eq!(
            provenance_note(Some("invoice"), Some("Community Health")),
            "Imported from Invoice — Community Health"
        );
    }

    #[test]
    fn test_date_parsing() {
        let draft = ImportDraft::from_extraction(ExtractionResult {
            items: vec![
                ExtractedItem {
                    date: Some("2025-03-14".into()),
                    ..item("A", Some(dec!(1)))
                },
                ExtractedItem {
                    date: Some("sometime".into()),
                    ..item("B", Some(dec!(1)))
                },
            ],
            ..ExtractionResult::default()
        });
        assert_eq!(draft.rows[0].date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(draft.rows[1].date, None);
    }
}
