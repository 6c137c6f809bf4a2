//! Name matching between extracted suggestions, budget nodes and aims.

use grantwise_shared::types::CategoryId;

use crate::budget::{BudgetTree, CategoryNode, MiniPoolNode};

/// Number of leading characters compared by the prefix rule.
pub const PREFIX_LEN: usize = 14;

/// Finds the candidate whose name best matches `target`.
///
/// Matching is case-insensitive. The first exact match anywhere in the list
/// wins; otherwise the first candidate whose name contains the target's first
/// [`PREFIX_LEN`] characters, or whose first [`PREFIX_LEN`] characters appear
/// in the target. Blank targets match nothing and blank names never match by
/// prefix.
pub fn fuzzy_find<'a, T, I, F>(target: &str, candidates: I, name: F) -> Option<&'a T>
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> &str,
    T: 'a,
{
    if target.trim().is_empty() {
        return None;
    }
    let target = target.to_lowercase();
    let lowered: Vec<(&'a T, String)> = candidates
        .into_iter()
        .map(|c| (c, name(c).to_lowercase()))
        .collect();

    if let Some((candidate, _)) = lowered.iter().find(|(_, n)| *n == target) {
        return Some(*candidate);
    }

    let target_prefix = prefix(&target);
    lowered
        .iter()
        .filter(|(_, n)| !n.trim().is_empty())
        .find(|(_, n)| n.contains(target_prefix) || target.contains(prefix(n)))
        .map(|(candidate, _)| *candidate)
}

fn prefix(s: &str) -> &str {
    match s.char_indices().nth(PREFIX_LEN) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Trims, collapses runs of whitespace and lowercases.
#[must_use]
pub fn normalize_label(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Name heuristic linking a category to an aim label such as "Aim 1".
///
/// Matches when the normalized names are equal, equal with spaces removed,
/// or when the category name starts with the label followed by a space,
/// hyphen or colon. Only used for categories without an explicit aim link.
#[must_use]
pub fn label_matches(category_name: &str, aim_label: &str) -> bool {
    let name = normalize_label(category_name);
    let label = normalize_label(aim_label);
    if label.is_empty() {
        return false;
    }
    if name == label || name.replace(' ', "") == label.replace(' ', "") {
        return true;
    }
    name.strip_prefix(&label)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| matches!(c, ' ' | '-' | ':'))
}

impl BudgetTree {
    /// Fuzzy-finds a category by name.
    pub fn find_category(&self, name: &str) -> Option<&CategoryNode> {
        fuzzy_find(name, self.categories(), |c| c.name.as_str())
    }

    /// Fuzzy-finds a mini-pool by description within one category.
    pub fn find_mini_pool(&self, category_id: CategoryId, name: &str) -> Option<&MiniPoolNode> {
        fuzzy_find(name, self.mini_pools_of(category_id), |m| {
            m.description.as_str()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn find(target: &str, list: &[&'static str]) -> Option<&'static str> {
        fuzzy_find(target, list.iter(), |s| *s).copied()
    }

    #[test]
    fn test_case_insensitive_exact_match() {
        assert_eq!(find("Aim 1", &["aim 1"]), Some("aim 1"));
    }

    #[test]
    fn test_prefix_rule_candidate_inside_target() {
        assert_eq!(find("Aim 1 — Outreach", &["Aim 1"]), Some("Aim 1"));
    }

    #[test]
    fn test_exact_match_beats_earlier_prefix_match() {
        let list = ["Personnel costs and benefits", "Personnel"];
        assert_eq!(find("personnel", &list), Some("Personnel"));
    }

    #[test]
    fn test_first_prefix_match_in_list_order() {
        let list = ["Travel domestic", "Travel international"];
        assert_eq!(find("travel", &list), Some("Travel domestic"));
    }

    #[test]
    fn test_long_target_matches_on_first_fourteen_chars() {
        let list = ["Equipment and supplies"];
        assert_eq!(
            find("Equipment and software licences", &list),
            Some("Equipment and supplies")
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_blank_target_matches_nothing(#[case] target: &str) {
        assert_eq!(find(target, &["Travel", ""]), None);
    }

    #[test]
    fn test_blank_candidate_never_prefix_matches() {
        assert_eq!(find("Consultants", &["", "  "]), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(find("Catering", &["Travel", "Personnel"]), None);
    }

    #[rstest]
    #[case("Aim 1", "Aim 1", true)]
    #[case("  AIM   1 ", "aim 1", true)]
    #[case("Aim1", "Aim 1", true)]
    #[case("Aim 1 - Community", "Aim 1", true)]
    #[case("Aim 1: Community", "Aim 1", true)]
    #[case("Aim 1 Community", "Aim 1", true)]
    #[case("Aim 10", "Aim 1", false)]
    #[case("Aim 1a", "Aim 1", false)]
    #[case("Personnel", "Aim 1", false)]
    #[case("Aim 1", "", false)]
    fn test_label_matches(#[case] name: &str, #[case] label: &str, #[case] expected: bool) {
        assert_eq!(label_matches(name, label), expected);
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Aim \t 2  "), "aim 2");
    }
}
