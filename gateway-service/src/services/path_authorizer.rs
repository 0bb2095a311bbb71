//! Matching of request and API URIs against a user's permission list.
//!
//! Two checks live here on purpose and they do not agree on overlapping
//! grants:
//! - [`filter_supported_apis`] resolves each advertised API against the
//!   *first* permission pattern that matches it, in list order. A later
//!   pattern granting more operations on the same API is not consulted.
//! - [`authorize`] is an exact string comparison on URIs, with no pattern
//!   expansion at all.

use crate::models::{Operation, Resource};
use crate::services::path_pattern::PathPattern;

/// Trims `advertised` down to what `permissions` allow.
///
/// APIs matched by no permission pattern are dropped. A retained API keeps
/// only the operations that both it and its first matching grant list.
/// Malformed permission patterns are skipped.
pub fn filter_supported_apis(advertised: &[Resource], permissions: &[Resource]) -> Vec<Resource> {
    let compiled: Vec<(PathPattern, &Resource)> = permissions
        .iter()
        .filter_map(|grant| match PathPattern::parse(&grant.uri) {
            Ok(pattern) => Some((pattern, grant)),
            Err(e) => {
                tracing::warn!(
                    uri = %grant.uri,
                    error = %e,
                    "Skipping malformed permission pattern"
                );
                None
            }
        })
        .collect();

    advertised
        .iter()
        .filter_map(|api| {
            compiled
                .iter()
                .find(|(pattern, _)| pattern.matches(&api.uri))
                .map(|(_, grant)| Resource {
                    uri: api.uri.clone(),
                    ops: api.ops.intersection(&grant.ops).copied().collect(),
                })
        })
        .collect()
}

/// True iff some entry has exactly `uri` and allows `op`.
pub fn authorize(resources: &[Resource], uri: &str, op: Operation) -> bool {
    resources.iter().any(|res| res.uri == uri && res.allows(op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use Operation::*;

    #[test]
    fn test_pattern_grant_trims_operations() {
        let permissions = vec![Resource::new("/orders/{id}", [Read])];
        let advertised = vec![Resource::new("/orders/{id}", [Read, Update])];

        let filtered = filter_supported_apis(&advertised, &permissions);

        assert_eq!(filtered, vec![Resource::new("/orders/{id}", [Read])]);
    }

    #[test]
    fn test_unmatched_apis_are_dropped() {
        let permissions = vec![Resource::new("/orders/{id}", [Read])];
        let advertised = vec![
            Resource::new("/orders/42", [Read, Delete]),
            Resource::new("/billing/pay", [Create]),
        ];

        let filtered = filter_supported_apis(&advertised, &permissions);

        assert_eq!(filtered, vec![Resource::new("/orders/42", [Read])]);
    }

    #[test]
    fn test_filtered_ops_are_subset_of_advertised() {
        let permissions = vec![
            Resource::new("/svc/**", Operation::ALL),
            Resource::new("/other/{id}", [Read, Create]),
        ];
        let advertised = vec![
            Resource::new("/svc/a", [Read]),
            Resource::new("/svc/a/b", [Update, Delete]),
            Resource::new("/other/1", [Delete]),
            Resource::new("/other/2", [Read, Update]),
        ];

        for api in filter_supported_apis(&advertised, &permissions) {
            let source = advertised.iter().find(|a| a.uri == api.uri).unwrap();
            assert!(
                api.ops.is_subset(&source.ops),
                "{:?} exceeds advertised operations",
                api
            );
        }
    }

    /// Known limitation: overlapping grants are not combined. Only the first
    /// matching pattern decides, even when a later one grants more.
    #[test]
    fn test_first_matching_pattern_wins() {
        let permissions = vec![
            Resource::new("/orders/{id}", [Read]),
            Resource::new("/orders/*", [Update]),
        ];
        let advertised = vec![Resource::new("/orders/7", [Read, Update])];

        let filtered = filter_supported_apis(&advertised, &permissions);

        assert_eq!(filtered, vec![Resource::new("/orders/7", [Read])]);
    }

    #[test]
    fn test_malformed_permission_is_skipped() {
        let permissions = vec![
            Resource::new("/orders/{id", Operation::ALL),
            Resource::new("/orders/{id}", [Read]),
        ];
        let advertised = vec![Resource::new("/orders/1", [Read, Delete])];

        let filtered = filter_supported_apis(&advertised, &permissions);

        assert_eq!(filtered, vec![Resource::new("/orders/1", [Read])]);
    }

    #[test]
    fn test_authorize_is_exact() {
        let resources = vec![Resource::new("/svc/a", [Read])];

        assert!(authorize(&resources, "/svc/a", Read));
        assert!(!authorize(&resources, "/svc/a", Delete));
        assert!(!authorize(&resources, "/svc/b", Read));
    }

    #[test]
    fn test_authorize_does_not_expand_patterns() {
        let resources = vec![Resource::new("/orders/{id}", [Read])];

        assert!(!authorize(&resources, "/orders/42", Read));
        assert!(authorize(&resources, "/orders/{id}", Read));
    }
}
