//! Core RBAC tuple types

use crate::error::{RbacError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix that marks a subject as a person-type principal
pub const USER_PREFIX: &str = "user:";

/// Longest identifier any store accepts, in characters. Matches the
/// `VARCHAR(256)` columns of the PostgreSQL table.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// Permission tuple: `subject` (a role or a literal subject) may perform
/// `action` on `object` within `domain`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Policy {
    pub domain: String,
    /// Role name or literal subject
    pub subject: String,
    pub object: String,
    pub action: String,
}

impl Policy {
    /// Create a policy in persisted field order `(role_or_subject, domain, object, action)`
    pub fn new(
        subject: impl Into<String>,
        domain: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("subject", &self.subject)?;
        validate_identifier("domain", &self.domain)?;
        validate_identifier("object", &self.object)?;
        validate_identifier("action", &self.action)
    }
}

/// Grant of `role` to `subject` within `domain`.
///
/// `subject` may itself be a role name, which gives role-to-role inheritance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoleAssignment {
    pub domain: String,
    pub role: String,
    pub subject: String,
}

impl RoleAssignment {
    /// Create an assignment in persisted field order `(subject, role, domain)`
    pub fn new(
        subject: impl Into<String>,
        role: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            role: role.into(),
            subject: subject.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("subject", &self.subject)?;
        validate_identifier("role", &self.role)?;
        validate_identifier("domain", &self.domain)?;
        if self.subject == self.role {
            return Err(RbacError::Validation(format!(
                "role '{}' cannot be assigned to itself",
                self.role
            )));
        }
        Ok(())
    }
}

/// Directed "is-a-child-of" edge between two domains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubdomainLink {
    pub parent: String,
    pub child: String,
}

impl SubdomainLink {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("parent domain", &self.parent)?;
        validate_identifier("child domain", &self.child)
    }
}

/// Kind tag of a persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TupleKind {
    Policy,
    Assignment,
    Subdomain,
}

impl TupleKind {
    /// Tag written in front of every persisted record
    pub fn tag(&self) -> &'static str {
        match self {
            TupleKind::Policy => "p",
            TupleKind::Assignment => "g",
            TupleKind::Subdomain => "g2",
        }
    }

    /// Number of fields following the tag
    pub fn arity(&self) -> usize {
        match self {
            TupleKind::Policy => 4,
            TupleKind::Assignment => 3,
            TupleKind::Subdomain => 2,
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "p" => Ok(TupleKind::Policy),
            "g" => Ok(TupleKind::Assignment),
            "g2" => Ok(TupleKind::Subdomain),
            other => Err(RbacError::Validation(format!("unknown tuple kind '{}'", other))),
        }
    }
}

impl fmt::Display for TupleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Any tuple the store can hold
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tuple {
    Policy(Policy),
    Assignment(RoleAssignment),
    Subdomain(SubdomainLink),
}

impl Tuple {
    pub fn kind(&self) -> TupleKind {
        match self {
            Tuple::Policy(_) => TupleKind::Policy,
            Tuple::Assignment(_) => TupleKind::Assignment,
            Tuple::Subdomain(_) => TupleKind::Subdomain,
        }
    }

    /// Fields in persisted order; arity is fixed per kind
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Tuple::Policy(p) => vec![
                p.subject.as_str(),
                p.domain.as_str(),
                p.object.as_str(),
                p.action.as_str(),
            ],
            Tuple::Assignment(a) => vec![a.subject.as_str(), a.role.as_str(), a.domain.as_str()],
            Tuple::Subdomain(l) => vec![l.child.as_str(), l.parent.as_str()],
        }
    }

    /// Rebuild a tuple from a kind tag and its fields
    pub fn from_record<S: AsRef<str>>(tag: &str, fields: &[S]) -> Result<Self> {
        let kind = TupleKind::from_tag(tag)?;
        if fields.len() != kind.arity() {
            return Err(RbacError::Validation(format!(
                "'{}' record expects {} fields, got {}",
                kind,
                kind.arity(),
                fields.len()
            )));
        }
        let f = |i: usize| fields[i].as_ref().to_string();
        let tuple = match kind {
            TupleKind::Policy => Tuple::Policy(Policy::new(f(0), f(1), f(2), f(3))),
            TupleKind::Assignment => Tuple::Assignment(RoleAssignment::new(f(0), f(1), f(2))),
            TupleKind::Subdomain => Tuple::Subdomain(SubdomainLink::new(f(1), f(0))),
        };
        tuple.validate()?;
        Ok(tuple)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Tuple::Policy(p) => p.validate(),
            Tuple::Assignment(a) => a.validate(),
            Tuple::Subdomain(l) => l.validate(),
        }
    }

    /// Render as a comma separated record line, tag first
    pub fn to_line(&self) -> String {
        let mut parts = vec![self.kind().tag()];
        parts.extend(self.fields());
        parts.join(", ")
    }
}

impl From<Policy> for Tuple {
    fn from(p: Policy) -> Self {
        Tuple::Policy(p)
    }
}

impl From<RoleAssignment> for Tuple {
    fn from(a: RoleAssignment) -> Self {
        Tuple::Assignment(a)
    }
}

impl From<SubdomainLink> for Tuple {
    fn from(l: SubdomainLink) -> Self {
        Tuple::Subdomain(l)
    }
}

/// Direction of an incremental store write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Add,
    Remove,
}

/// Reject identifiers that are empty or cannot round-trip through a record
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RbacError::Validation(format!("{} must not be empty", field)));
    }
    if value.trim() != value {
        return Err(RbacError::Validation(format!(
            "{} must not have surrounding whitespace",
            field
        )));
    }
    let len = value.chars().count();
    if len > MAX_IDENTIFIER_LEN {
        return Err(RbacError::Validation(format!(
            "{} is {} characters long, the limit is {}",
            field, len, MAX_IDENTIFIER_LEN
        )));
    }
    if value.contains(',') || value.chars().any(char::is_control) {
        return Err(RbacError::Validation(format!(
            "{} contains a forbidden character: {:?}",
            field, value
        )));
    }
    Ok(())
}

/// Subject string for a person-type principal
pub fn user_subject(user: &str) -> String {
    format!("{}{}", USER_PREFIX, user)
}
