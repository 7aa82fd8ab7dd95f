//! Deterministic ordering helpers.
//!
//! Evidence collections (permissions, components, endpoints) are reported
//! in a stable order so that identical inputs always produce identical
//! findings and recommendations.

/// Sort lexicographically and drop exact duplicates.
pub fn sort_unique(items: &mut Vec<String>) {
    items.sort();
    items.dedup();
}

/// Drop later duplicates while keeping first-seen order.
///
/// Used where position carries meaning, e.g. endpoints are capped to the
/// first N occurrences in the document.
pub fn dedup_preserving_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}
