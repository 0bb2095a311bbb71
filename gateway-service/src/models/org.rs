//! Organization model - hierarchy encoded in the id prefix.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Organization entity.
///
/// Org `b` is a descendant of org `a` iff `b.id` starts with `a.id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct Organization {
    #[validate(length(min = 1, max = 64, message = "Organization id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "Organization name is required"))]
    pub name: String,
}

impl Organization {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// True when `other` sits below this organization in the hierarchy.
    pub fn is_ancestor_of(&self, other: &Organization) -> bool {
        other.id.len() > self.id.len() && other.id.starts_with(&self.id)
    }
}

/// Read-only projection of the organization hierarchy.
///
/// `children` is `None` for a leaf, never `Some(vec![])`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgTree {
    pub org: Organization,
    pub children: Option<Vec<OrgTree>>,
}

impl OrgTree {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Number of organizations in this subtree, root included.
    pub fn size(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(OrgTree::size)
            .sum::<usize>()
    }
}
