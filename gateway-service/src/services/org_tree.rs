//! Rebuilds the organization forest from flat, prefix-encoded ids.

use crate::models::{OrgTree, Organization};

/// Builds the organization forest.
///
/// Input is sorted by id before building, so callers may pass repository
/// output directly. With ascending ids an ancestor is always taken as a root
/// before any of its descendants, which is what makes the single-pass
/// partition below correct. Worst case is O(n²), fine for administrative
/// organization counts.
pub fn build_forest(mut orgs: Vec<Organization>) -> Vec<OrgTree> {
    orgs.sort_by(|a, b| a.id.cmp(&b.id));
    orgs.dedup_by(|a, b| a.id == b.id);
    make_tree(orgs)
}

fn make_tree(orgs: Vec<Organization>) -> Vec<OrgTree> {
    let mut forest = Vec::new();
    let mut remaining = orgs;

    while !remaining.is_empty() {
        let mut iter = remaining.into_iter();
        let Some(root) = iter.next() else {
            break;
        };

        let (descendants, others): (Vec<_>, Vec<_>) =
            iter.partition(|org| root.is_ancestor_of(org));
        remaining = others;

        let children = if descendants.is_empty() {
            None
        } else {
            Some(make_tree(descendants))
        };
        forest.push(OrgTree {
            org: root,
            children,
        });
    }

    forest
}
