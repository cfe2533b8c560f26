// src/pipeline/bounds.rs

//! Commit timestamp windows over the index and its pages.
//!
//! Both selectors treat the window as `(min, max]`: the lower bound is the
//! cursor, already processed, and the upper bound is inclusive.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CatalogIndex, CatalogItem, CatalogPage, LeafRef, NuGetVersion, PageRef};

/// Pages that may hold leaves in `(min, max]`, oldest first.
///
/// A page's timestamp is the newest commit it contains, so the first page
/// newer than `max` can still hold leaves at or below `max`. It is kept; every
/// page after it is not.
pub fn select_pages(
    index: &CatalogIndex,
    min: DateTime<Utc>,
    max: DateTime<Utc>,
) -> Vec<PageRef> {
    let mut candidates: Vec<&PageRef> = index
        .items
        .iter()
        .filter(|page| page.commit_timestamp > min)
        .collect();
    candidates.sort_by_key(|page| page.commit_timestamp);

    let mut selected = Vec::new();
    for page in candidates {
        selected.push(page.clone());
        if page.commit_timestamp > max {
            break;
        }
    }
    selected
}

/// Leaves of a page inside `(min, max]` in processing order.
///
/// With `exclude_redundant`, only the newest leaf of each (package id,
/// version) pair survives. The id comparison there is exact while the final
/// ordering compares ids case-insensitively, falling back to the exact id.
/// Any unparseable version fails the whole page.
pub fn select_leaves(
    page: &CatalogPage,
    min: DateTime<Utc>,
    max: DateTime<Utc>,
    exclude_redundant: bool,
) -> Result<Vec<LeafRef>> {
    let mut leaves = Vec::new();
    for leaf in &page.items {
        if leaf.commit_timestamp > min && leaf.commit_timestamp <= max {
            let version = leaf.parse_package_version()?;
            leaves.push((leaf.clone(), version));
        }
    }
    leaves.sort_by_key(|(leaf, _)| leaf.commit_timestamp);

    if exclude_redundant {
        let mut latest: HashMap<(String, NuGetVersion), (LeafRef, NuGetVersion)> =
            HashMap::with_capacity(leaves.len());
        for (leaf, version) in leaves {
            let key = (leaf.package_id.clone(), version.clone());
            latest.insert(key, (leaf, version));
        }
        leaves = latest.into_values().collect();
    }

    leaves.sort_by(|(a, va), (b, vb)| {
        a.commit_timestamp
            .cmp(&b.commit_timestamp)
            .then_with(|| a.package_id.to_lowercase().cmp(&b.package_id.to_lowercase()))
            .then_with(|| va.cmp(vb))
            .then_with(|| a.package_id.cmp(&b.package_id))
    });

    Ok(leaves.into_iter().map(|(leaf, _)| leaf).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeafKind;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()
    }

    fn index(stamps: &[i64]) -> CatalogIndex {
        CatalogIndex {
            url: None,
            commit_id: None,
            commit_timestamp: ts(*stamps.iter().max().unwrap_or(&0)),
            count: stamps.len() as u64,
            items: stamps
                .iter()
                .map(|s| PageRef {
                    url: format!("page{s}.json"),
                    commit_id: None,
                    commit_timestamp: ts(*s),
                    count: 1,
                })
                .collect(),
        }
    }

    fn leaf(kind: LeafKind, id: &str, version: &str, secs: i64) -> LeafRef {
        LeafRef {
            url: format!("{id}.{version}.{secs}.json"),
            kind,
            commit_id: None,
            commit_timestamp: ts(secs),
            package_id: id.into(),
            package_version: version.into(),
        }
    }

    fn page(items: Vec<LeafRef>) -> CatalogPage {
        CatalogPage {
            url: None,
            commit_id: None,
            commit_timestamp: items.iter().map(|l| l.commit_timestamp).max().unwrap_or(ts(0)),
            count: items.len() as u64,
            items,
            parent: None,
        }
    }

    fn names(leaves: &[LeafRef]) -> Vec<String> {
        leaves
            .iter()
            .map(|l| format!("{}@{}", l.package_id, l.package_version))
            .collect()
    }

    #[test]
    fn test_select_pages_take_while_plus_one() {
        let selected = select_pages(&index(&[10, 20, 30, 40]), ts(15), ts(25));
        let stamps: Vec<_> = selected.iter().map(|p| p.commit_timestamp).collect();
        assert_eq!(stamps, vec![ts(20), ts(30)]);
    }

    #[test]
    fn test_select_pages_unsorted_index() {
        let selected = select_pages(&index(&[40, 10, 30, 20]), ts(10), ts(100));
        let stamps: Vec<_> = selected.iter().map(|p| p.commit_timestamp).collect();
        assert_eq!(stamps, vec![ts(20), ts(30), ts(40)]);
    }

    #[test]
    fn test_select_pages_nothing_new() {
        assert!(select_pages(&index(&[10, 20]), ts(20), ts(100)).is_empty());
        assert!(select_pages(&index(&[]), ts(0), ts(100)).is_empty());
    }

    #[test]
    fn test_select_leaves_window_bounds() {
        let p = page(vec![
            leaf(LeafKind::PackageDetails, "A", "1.0.0", 5),
            leaf(LeafKind::PackageDetails, "B", "1.0.0", 6),
            leaf(LeafKind::PackageDetails, "C", "1.0.0", 7),
        ]);
        let selected = select_leaves(&p, ts(5), ts(6), true).unwrap();
        assert_eq!(names(&selected), vec!["B@1.0.0"]);
    }

    #[test]
    fn test_select_leaves_tie_break() {
        let p = page(vec![
            leaf(LeafKind::PackageDetails, "B", "1.0", 5),
            leaf(LeafKind::PackageDetails, "A", "2.0", 5),
            leaf(LeafKind::PackageDetails, "A", "1.0", 5),
        ]);
        let selected = select_leaves(&p, ts(0), ts(10), false).unwrap();
        assert_eq!(names(&selected), vec!["A@1.0", "A@2.0", "B@1.0"]);
    }

    #[test]
    fn test_select_leaves_orders_ids_ignoring_case() {
        let p = page(vec![
            leaf(LeafKind::PackageDetails, "beta", "1.0", 5),
            leaf(LeafKind::PackageDetails, "Alpha", "1.0", 5),
        ]);
        let selected = select_leaves(&p, ts(0), ts(10), false).unwrap();
        assert_eq!(names(&selected), vec!["Alpha@1.0", "beta@1.0"]);
    }

    #[test]
    fn test_select_leaves_collapses_redundant() {
        let p = page(vec![
            leaf(LeafKind::PackageDetails, "A", "1.0.0", 3),
            leaf(LeafKind::PackageDelete, "A", "1.0", 5),
            leaf(LeafKind::PackageDetails, "B", "1.0.0", 4),
        ]);

        let selected = select_leaves(&p, ts(0), ts(10), true).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].package_id, "B");
        assert_eq!(selected[1].kind, LeafKind::PackageDelete);
        assert_eq!(selected[1].commit_timestamp, ts(5));

        let all = select_leaves(&p, ts(0), ts(10), false).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_select_leaves_grouping_is_case_sensitive() {
        let p = page(vec![
            leaf(LeafKind::PackageDetails, "Pkg", "1.0.0", 3),
            leaf(LeafKind::PackageDetails, "pkg", "1.0.0", 4),
        ]);
        let selected = select_leaves(&p, ts(0), ts(10), true).unwrap();
        assert_eq!(names(&selected), vec!["Pkg@1.0.0", "pkg@1.0.0"]);
    }

    #[test]
    fn test_select_leaves_case_variants_order_is_stable() {
        let p = page(vec![
            leaf(LeafKind::PackageDetails, "pkg", "1.0.0", 4),
            leaf(LeafKind::PackageDelete, "Pkg", "1.0.0", 4),
        ]);
        for _ in 0..16 {
            let selected = select_leaves(&p, ts(0), ts(10), true).unwrap();
            assert_eq!(names(&selected), vec!["Pkg@1.0.0", "pkg@1.0.0"]);
        }
    }

    #[test]
    fn test_select_leaves_bad_version_fails() {
        let p = page(vec![leaf(LeafKind::PackageDetails, "A", "not-a-version", 3)]);
        assert!(select_leaves(&p, ts(0), ts(10), true).unwrap_err().is_parse());
        // Outside the window nothing is parsed
        assert!(select_leaves(&p, ts(3), ts(10), true).unwrap().is_empty());
    }
}
