//! Per-operation access policy.
//!
//! Every `UserService` operation maps to either public access or a set of roles
//! allowed to call it. Operations without an entry fail closed: a credential
//! is still required and every role is denied.

use std::collections::HashMap;
use std::fmt;

use tessera_auth::Role;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateUser,
    CreateAdmin,
    GetUser,
    UpdateUser,
    DeleteUser,
    LoginUser,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::CreateUser,
        Operation::CreateAdmin,
        Operation::GetUser,
        Operation::UpdateUser,
        Operation::DeleteUser,
        Operation::LoginUser,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateUser => "CreateUser",
            Operation::CreateAdmin => "CreateAdmin",
            Operation::GetUser => "GetUser",
            Operation::UpdateUser => "UpdateUser",
            Operation::DeleteUser => "DeleteUser",
            Operation::LoginUser => "LoginUser",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Roles(Vec<Role>),
}

impl Access {
    pub fn roles(roles: &[Role]) -> Self {
        Access::Roles(roles.to_vec())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("malformed role override '{0}', expected Operation=role|role or Operation=public")]
    Malformed(String),
    #[error("unknown operation '{0}' in role override")]
    UnknownOperation(String),
    #[error("unknown role '{role}' for operation {operation}")]
    UnknownRole { operation: String, role: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    entries: HashMap<Operation, Access>,
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::empty()
            .with(Operation::CreateUser, Access::Public)
            .with(Operation::CreateAdmin, Access::roles(&[Role::Admin]))
            .with(Operation::GetUser, Access::roles(&[Role::Admin]))
            .with(
                Operation::UpdateUser,
                Access::roles(&[Role::Admin, Role::Standard]),
            )
            .with(
                Operation::DeleteUser,
                Access::roles(&[Role::Admin, Role::Standard]),
            )
            .with(Operation::LoginUser, Access::Public)
    }
}

impl RoleTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with(mut self, operation: Operation, access: Access) -> Self {
        self.entries.insert(operation, access);
        self
    }

    /// Access rule for an operation name as it appears in the request path.
    ///
    /// Unknown names and operations missing from the table resolve to an empty
    /// role set.
    pub fn access(&self, operation: &str) -> Access {
        Operation::from_name(operation)
            .and_then(|op| self.entries.get(&op))
            .cloned()
            .unwrap_or(Access::Roles(Vec::new()))
    }

    /// Applies `Op=role|role;Op=public` overrides on top of the current table.
    ///
    /// Whitespace around entries is ignored. An empty role list is allowed and
    /// locks the operation entirely.
    pub fn apply_overrides(mut self, overrides: &str) -> Result<Self, PolicyError> {
        for entry in overrides.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, rule) = entry
                .split_once('=')
                .ok_or_else(|| PolicyError::Malformed(entry.to_string()))?;
            let name = name.trim();
            let operation = Operation::from_name(name)
                .ok_or_else(|| PolicyError::UnknownOperation(name.to_string()))?;

            let rule = rule.trim();
            let access = if rule.eq_ignore_ascii_case("public") {
                Access::Public
            } else {
                let roles = rule
                    .split('|')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(|r| {
                        r.parse::<Role>().map_err(|_| PolicyError::UnknownRole {
                            operation: name.to_string(),
                            role: r.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Access::Roles(roles)
            };

            self.entries.insert(operation, access);
        }
        Ok(self)
    }
}
