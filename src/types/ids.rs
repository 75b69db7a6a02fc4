//! Newtype wrappers for domain identifiers.
//!
//! These keep competitor names, group names and ledger sequence numbers from
//! being mixed up, and validate names once at the boundary so the ledger's
//! comma-delimited lines never need escaping.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Characters that would break a ledger line if they appeared in a name.
const FORBIDDEN_NAME_CHARS: [char; 3] = [',', '\n', '\r'];

/// A name was rejected because it is empty or contains a ledger delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid name {0:?}: names must be non-empty and contain no commas or line breaks")]
pub struct InvalidName(pub String);

fn validate_name(s: &str) -> Result<(), InvalidName> {
    if s.trim().is_empty() || s.contains(FORBIDDEN_NAME_CHARS) {
        return Err(InvalidName(s.to_string()));
    }
    Ok(())
}

/// A competitor's name, unique within its group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompetitorName(String);

impl CompetitorName {
    /// Parses a competitor name, rejecting empty names and ledger delimiters.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidName> {
        let s = s.into();
        validate_name(&s)?;
        Ok(CompetitorName(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompetitorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CompetitorName {
    type Error = InvalidName;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        CompetitorName::parse(s)
    }
}

impl From<CompetitorName> for String {
    fn from(name: CompetitorName) -> Self {
        name.0
    }
}

/// A group (heat) name, unique within an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    /// Parses a group name, rejecting empty names and ledger delimiters.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidName> {
        let s = s.into();
        validate_name(&s)?;
        Ok(GroupName(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for GroupName {
    type Error = InvalidName;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        GroupName::parse(s)
    }
}

impl From<GroupName> for String {
    fn from(name: GroupName) -> Self {
        name.0
    }
}

/// A ledger sequence number.
///
/// Issued from a single monotonically increasing counter owned by the event.
/// A revision line repeats the number of the attempt it re-accepts; no two
/// attempts ever share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerSeq(pub u64);

impl LedgerSeq {
    /// The number after this one.
    pub fn next(self) -> Self {
        LedgerSeq(self.0 + 1)
    }
}

impl fmt::Display for LedgerSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LedgerSeq {
    fn from(n: u64) -> Self {
        LedgerSeq(n)
    }
}
