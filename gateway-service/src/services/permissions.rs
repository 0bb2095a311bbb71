//! Merges per-role grants into a user's effective permission set.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Operation, Resource, Role};

/// Fully-qualified URI of a resource: `/{service_id}{resource_uri}`.
pub fn qualified_uri(svc_id: &str, uri: &str) -> String {
    format!("/{}{}", svc_id, uri)
}

/// URI → union of operations granted across all of a user's roles.
///
/// Keyed by URI in ascending order, so the result (and its list form) does not
/// depend on the order roles or services were supplied in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissionSet {
    grants: BTreeMap<String, BTreeSet<Operation>>,
}

impl EffectivePermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a grant; operations for an already-present URI are unioned.
    pub fn grant(&mut self, uri: impl Into<String>, ops: impl IntoIterator<Item = Operation>) {
        self.grants.entry(uri.into()).or_default().extend(ops);
    }

    pub fn ops(&self, uri: &str) -> Option<&BTreeSet<Operation>> {
        self.grants.get(uri)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// List form embedded in session tokens, ordered by URI.
    pub fn into_resources(self) -> Vec<Resource> {
        self.grants
            .into_iter()
            .map(|(uri, ops)| Resource { uri, ops })
            .collect()
    }
}

impl FromIterator<Resource> for EffectivePermissionSet {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut set = Self::new();
        for res in iter {
            set.grant(res.uri, res.ops);
        }
        set
    }
}

/// Effective permissions of a user holding `roles`.
pub fn effective_permissions<'a>(
    roles: impl IntoIterator<Item = &'a Role>,
) -> EffectivePermissionSet {
    roles
        .into_iter()
        .flat_map(|role| role.svcs.iter())
        .flat_map(|svc| {
            svc.resources.iter().map(move |res| {
                Resource::new(qualified_uri(&svc.id, &res.uri), res.ops.iter().copied())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Service;

    fn role(id: &str, svc: &str, grants: &[(&str, &[Operation])]) -> Role {
        Role::new(
            id,
            [Service::new(
                svc,
                grants
                    .iter()
                    .map(|(uri, ops)| Resource::new(*uri, ops.iter().copied())),
            )],
        )
    }

    #[test]
    fn test_qualified_uri() {
        assert_eq!(qualified_uri("orders", "/list"), "/orders/list");
    }

    #[test]
    fn test_union_of_overlapping_grants() {
        let a = role("a", "svc", &[("/x", &[Operation::Read])]);
        let b = role("b", "svc", &[("/x", &[Operation::Update])]);

        let merged = effective_permissions([&a, &b]).into_resources();

        assert_eq!(
            merged,
            vec![Resource::new("/svc/x", [Operation::Read, Operation::Update])]
        );
    }

    #[test]
    fn test_role_order_does_not_matter() {
        let roles = vec![
            role("a", "orders", &[("/list", &[Operation::Read]), ("/{id}", &[Operation::Read])]),
            role("b", "orders", &[("/{id}", &[Operation::Update, Operation::Delete])]),
            role("c", "billing", &[("/pay", &[Operation::Create])]),
        ];

        let forward = effective_permissions(roles.iter());
        let backward = effective_permissions(roles.iter().rev());
        let rotated = effective_permissions(roles[1..].iter().chain(roles[..1].iter()));

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
        assert_eq!(forward.len(), 3);
        assert_eq!(
            forward.ops("/orders/{id}").map(|ops| ops.len()),
            Some(3)
        );
    }

    #[test]
    fn test_no_roles_means_no_permissions() {
        assert!(effective_permissions(std::iter::empty::<&Role>()).is_empty());
    }
}
