//! # Error Types: Credential Operation Rejections
//!
//! Every error here is a rejection of one attempted operation. None is fatal
//! to the process, none leaves partial state behind, and none is worth
//! retrying without different inputs.
//!
//! Each variant carries enough context for a human-readable reason and
//! exposes a stable machine code through [`CredentialError::code`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{CredentialId, CredentialKind, Identity};

/// The role an operation demanded of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The configured issuing authority.
    Authority,
    /// The current holder of the credential.
    Holder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authority => f.write_str("the issuing authority"),
            Self::Holder => f.write_str("the credential holder"),
        }
    }
}

/// Rejection of a credential lifecycle operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Caller lacks the role the operation requires.
    #[error("unauthorized: {caller} is not {role}")]
    Unauthorized {
        /// The rejected caller.
        caller: Identity,
        /// The role that was required.
        role: Role,
    },

    /// The id was never issued or has been burned.
    #[error("credential {id} not found")]
    NotFound {
        /// The missing id.
        id: CredentialId,
    },

    /// The holder already holds a live Passport.
    #[error("{holder} already holds live passport {existing}")]
    DuplicateHolder {
        /// The holder that was to receive a second Passport.
        holder: Identity,
        /// The Passport they already hold.
        existing: CredentialId,
    },

    /// The operation does not apply to this credential variant.
    #[error("credential {id} is a {actual}, operation requires a {expected}")]
    WrongVariant {
        /// The credential addressed.
        id: CredentialId,
        /// Variant the operation applies to.
        expected: CredentialKind,
        /// Variant actually found.
        actual: CredentialKind,
    },

    /// Visa window parameters are unusable.
    #[error("invalid visa duration: {reason}")]
    InvalidDuration {
        /// What was wrong with the window.
        reason: String,
    },

    /// Any holder change other than issuance or burn.
    #[error("credential {id} is bound to its holder and cannot be transferred")]
    NonTransferable {
        /// The credential a transfer was attempted on.
        id: CredentialId,
    },

    /// Issuance to the zero/absent identity.
    #[error("{holder} cannot hold a credential")]
    InvalidHolder {
        /// The rejected holder.
        holder: Identity,
    },

    /// The registry has handed out every representable id.
    #[error("credential id space exhausted")]
    IdsExhausted,
}

impl CredentialError {
    /// Stable machine-readable code for the rejection.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DuplicateHolder { .. } => "DUPLICATE_HOLDER",
            Self::WrongVariant { .. } => "WRONG_VARIANT",
            Self::InvalidDuration { .. } => "INVALID_DURATION",
            Self::NonTransferable { .. } => "NON_TRANSFERABLE",
            Self::InvalidHolder { .. } => "INVALID_HOLDER",
            Self::IdsExhausted => "IDS_EXHAUSTED",
        }
    }
}

/// A string could not be interpreted as an [`Identity`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Empty identity string.
    #[error("identity must not be empty")]
    Empty,

    /// Identity contained whitespace.
    #[error("identity {0:?} must not contain whitespace")]
    ContainsWhitespace(String),
}
