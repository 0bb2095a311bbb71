//! Roles, services and resource grants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Operation a grant allows on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "READ",
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "READ" => Ok(Operation::Read),
            "CREATE" => Ok(Operation::Create),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            _ => Err(format!("Invalid operation: {}", s)),
        }
    }
}

/// Permission grant on one URI.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub uri: String,
    pub ops: BTreeSet<Operation>,
}

impl Resource {
    pub fn new(uri: impl Into<String>, ops: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            uri: uri.into(),
            ops: ops.into_iter().collect(),
        }
    }

    pub fn allows(&self, op: Operation) -> bool {
        self.ops.contains(&op)
    }
}

/// Declared API surface of one backend service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Validate)]
pub struct Service {
    #[validate(length(min = 1, max = 64, message = "Service id is required"))]
    pub id: String,
    #[serde(default)]
    pub resources: BTreeSet<Resource>,
}

impl Service {
    pub fn new(id: impl Into<String>, resources: impl IntoIterator<Item = Resource>) -> Self {
        Self {
            id: id.into(),
            resources: resources.into_iter().collect(),
        }
    }
}

/// Named bundle of service grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Role {
    #[validate(length(min = 1, max = 64, message = "Role id is required"))]
    pub id: String,
    #[serde(default)]
    pub svcs: BTreeSet<Service>,
}

impl Role {
    pub fn new(id: impl Into<String>, svcs: impl IntoIterator<Item = Service>) -> Self {
        Self {
            id: id.into(),
            svcs: svcs.into_iter().collect(),
        }
    }

    pub fn references_service(&self, svc_id: &str) -> bool {
        self.svcs.iter().any(|svc| svc.id == svc_id)
    }

    /// Copy of this role without any grant coming from `svc_id`.
    pub fn without_service(&self, svc_id: &str) -> Self {
        Self {
            id: self.id.clone(),
            svcs: self
                .svcs
                .iter()
                .filter(|svc| svc.id != svc_id)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_wire_format() {
        let json = serde_json::to_string(&Resource::new("/a", [Operation::Update, Operation::Read]))
            .unwrap();
        assert_eq!(json, r#"{"uri":"/a","ops":["READ","UPDATE"]}"#);
        assert_eq!("delete".parse::<Operation>(), Ok(Operation::Delete));
        assert!("PATCH".parse::<Operation>().is_err());
    }

    #[test]
    fn test_role_without_service() {
        let role = Role::new(
            "ops",
            [
                Service::new("orders", [Resource::new("/list", [Operation::Read])]),
                Service::new("billing", [Resource::new("/pay", [Operation::Create])]),
            ],
        );

        let trimmed = role.without_service("orders");
        assert!(role.references_service("orders"));
        assert!(!trimmed.references_service("orders"));
        assert!(trimmed.references_service("billing"));
    }
}
