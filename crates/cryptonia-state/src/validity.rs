//! # Validity Engine
//!
//! Pure functions deciding whether a credential's window includes `now`.
//!
//! | Variant  | Valid when                                          |
//! |----------|-----------------------------------------------------|
//! | Passport | `issued_at <= now <= expires_at`                    |
//! | Visa     | `!cancelled && valid_from <= now <= valid_until`    |
//!
//! Both bounds are inclusive. There are no error conditions: a missing
//! credential is simply not valid.

use serde::{Deserialize, Serialize};

use cryptonia_core::Timestamp;

use crate::credential::{Credential, CredentialTerms};

/// An inclusive `[start, end]` time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    /// First valid instant.
    pub start: Timestamp,
    /// Last valid instant.
    pub end: Timestamp,
}

impl ValidityWindow {
    /// Whether `now` lies within the window, bounds included.
    pub fn contains(&self, now: Timestamp) -> bool {
        now >= self.start && now <= self.end
    }
}

/// Where `now` falls relative to a credential's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidityStatus {
    /// Before the window opens.
    NotYetValid,
    /// Inside the window.
    Valid,
    /// After the window closed.
    Expired,
    /// Visa cancelled by the authority.
    Cancelled,
}

impl ValidityStatus {
    /// Whether this status means the credential is currently valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl std::fmt::Display for ValidityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotYetValid => "NOT_YET_VALID",
            Self::Valid => "VALID",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// The inclusive validity window of a credential, ignoring cancellation.
pub fn window(credential: &Credential) -> ValidityWindow {
    match credential.terms() {
        CredentialTerms::Passport(p) => ValidityWindow {
            start: credential.issued_at(),
            end: p.expires_at,
        },
        CredentialTerms::Visa(v) => ValidityWindow {
            start: v.valid_from,
            end: v.valid_until,
        },
    }
}

/// Classify `now` against the credential's lifecycle.
///
/// Cancellation wins over the window: a cancelled Visa reports `Cancelled`
/// at every instant.
pub fn status(credential: &Credential, now: Timestamp) -> ValidityStatus {
    if credential.is_cancelled() {
        return ValidityStatus::Cancelled;
    }
    let w = window(credential);
    if now < w.start {
        ValidityStatus::NotYetValid
    } else if now > w.end {
        ValidityStatus::Expired
    } else {
        ValidityStatus::Valid
    }
}

/// Whether the credential is valid at `now`.
pub fn is_valid(credential: &Credential, now: Timestamp) -> bool {
    status(credential, now).is_valid()
}

/// Like [`is_valid`], treating an absent credential as invalid.
pub fn is_valid_opt(credential: Option<&Credential>, now: Timestamp) -> bool {
    credential.is_some_and(|c| is_valid(c, now))
}
