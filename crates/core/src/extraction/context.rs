//! Plain-text rendering of a budget tree for the extractor.

use std::fmt::Write;

use crate::budget::BudgetTree;

/// Renders categories and mini-pools with their allocations, one per line.
#[must_use]
pub fn budget_context(tree: &BudgetTree) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Budget {} (total {})",
        tree.fiscal_year(),
        tree.total_budget()
    );
    if tree.categories().next().is_none() {
        out.push_str("No categories yet.\n");
        return out;
    }
    for category in tree.categories() {
        let _ = writeln!(
            out,
            "- Category: {} (allocated {})",
            category.name, category.allocated
        );
        for mini_pool in tree.mini_pools_of(category.id) {
            let _ = writeln!(
                out,
                "  - Mini-pool: {} (allocated {})",
                mini_pool.description, mini_pool.allocated
            );
        }
    }
    out
}
