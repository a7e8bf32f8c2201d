/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Organizations served by this API. Each tenant owns a parallel set of
/// collections and routes; nothing is shared between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tenant {
    Default,
    Nirvin,
}

impl Tenant {
    pub const ALL: [Tenant; 2] = [Tenant::Default, Tenant::Nirvin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tenant::Default => "default",
            Tenant::Nirvin => "nirvin",
        }
    }
}

impl std::fmt::Display for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record operations exposed for every resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::List,
        Operation::Get,
        Operation::Update,
        Operation::Delete,
    ];

    /// HTTP method and whether the route carries an `:id` segment
    pub fn route(&self) -> (&'static str, bool) {
        match self {
            Operation::Create => ("POST", false),
            Operation::List => ("GET", false),
            Operation::Get => ("GET", true),
            Operation::Update => ("PUT", true),
            Operation::Delete => ("DELETE", true),
        }
    }

    /// Verb used in error messages ("Error adding employee")
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "adding",
            Operation::List | Operation::Get => "fetching",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
        }
    }
}
