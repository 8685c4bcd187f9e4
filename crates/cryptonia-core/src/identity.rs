//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the principals and credential identifiers of the
//! credential lifecycle. These prevent accidental confusion: a holder
//! address cannot be passed where a credential id is expected.
//!
//! ## Security Invariant
//!
//! An `Identity` is opaque. Beyond construction-time validation it carries
//! no attributes and is compared by exact equality only. The zero address
//! is representable (callers may name it) but is never a valid holder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// An opaque, already-authenticated principal (address-equivalent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create an identity, rejecting empty or whitespace-bearing values.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        if value.is_empty() {
            return Err(IdentityError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(IdentityError::ContainsWhitespace(value));
        }
        Ok(Self(value))
    }

    /// Whether this is the zero/absent address (`0x` followed only by zeros).
    pub fn is_zero(&self) -> bool {
        let digits = self
            .0
            .strip_prefix("0x")
            .or_else(|| self.0.strip_prefix("0X"));
        match digits {
            Some(d) => !d.is_empty() && d.bytes().all(|b| b == b'0'),
            None => false,
        }
    }

    /// Access the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

/// Identifier of an issued credential.
///
/// Allocated from 1 upward by the registry and never reused, so a retired
/// (burned) id keeps pointing at nothing forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(u64);

impl CredentialId {
    /// The first id a fresh registry hands out.
    pub const FIRST: CredentialId = CredentialId(1);

    /// Wrap a raw id. Zero is not a valid credential id.
    pub fn new(raw: u64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// The raw integer value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The id allocated after this one, or `None` on exhaustion.
    pub fn successor(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The credential variant discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialKind {
    /// Long-lived identity credential.
    Passport,
    /// Time-bounded authorization credential.
    Visa,
}

impl CredentialKind {
    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "PASSPORT",
            Self::Visa => "VISA",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
