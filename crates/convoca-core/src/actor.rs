//! Caller identity supplied by the identity collaborator.
//!
//! The core trusts this identity without re-verifying credentials; the
//! transport edge is responsible for authenticating it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role claim attached to every incoming operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// A sponsoring company account.
    Company,
    /// A non-governmental organization account.
    Ngo,
    /// An external individual who participates in events.
    ExternalMember,
    /// Platform administrator.
    SuperAdmin,
}

impl Role {
    /// Returns the kebab-case tag for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Ngo => "ngo",
            Self::ExternalMember => "external-member",
            Self::SuperAdmin => "super-admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(Self::Company),
            "ngo" => Ok(Self::Ngo),
            "external-member" => Ok(Self::ExternalMember),
            "super-admin" => Ok(Self::SuperAdmin),
            other => Err(format!("unknown role tag: {other}")),
        }
    }
}

/// Opaque actor identity: a ledger user id plus a role claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// The actor's numeric ledger id.
    pub ledger_id: i64,
    /// The actor's role claim.
    pub role: Role,
}

impl Actor {
    /// Creates an actor identity.
    #[must_use]
    pub const fn new(ledger_id: i64, role: Role) -> Self {
        Self { ledger_id, role }
    }
}
