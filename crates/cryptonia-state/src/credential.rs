//! # Credential Records
//!
//! A credential is a tagged union: the fields every credential shares
//! (`id`, `holder`, `metadata_ref`, `issued_at`) plus variant terms.
//!
//! ```text
//! Passport:  issued_at ─────────────────────────────▶ expires_at   (issued_at + 10y)
//! Visa:      issued_at ──offset──▶ valid_from ──duration──▶ valid_until
//!                                   (gated by !cancelled)
//! ```
//!
//! Records are only constructed and mutated inside this crate. Outside
//! code reads them through accessors, so the holder of a credential can
//! only change through the registry's create and remove paths.

use serde::{Deserialize, Serialize};

use cryptonia_core::{
    CredentialError, CredentialId, CredentialKind, Identity, Timestamp, PASSPORT_VALIDITY_SECS,
};

// ─── Issuance Terms ──────────────────────────────────────────────────

/// Variant-specific parameters supplied at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueTerms {
    /// A Passport; its lifetime is fixed.
    Passport,
    /// A Visa starting `start_offset` seconds after issuance and lasting
    /// `duration` seconds.
    Visa {
        /// Delay between issuance and the start of validity (>= 0).
        start_offset: i64,
        /// Length of the validity window (> 0).
        duration: i64,
    },
}

impl IssueTerms {
    /// The variant these terms produce.
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::Passport => CredentialKind::Passport,
            Self::Visa { .. } => CredentialKind::Visa,
        }
    }
}

// ─── Variant Terms ───────────────────────────────────────────────────

/// Validity terms of a Passport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportTerms {
    /// Last valid instant (inclusive).
    pub expires_at: Timestamp,
}

/// Validity terms of a Visa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaTerms {
    /// First valid instant (inclusive).
    pub valid_from: Timestamp,
    /// Window length in seconds.
    pub valid_duration: i64,
    /// Last valid instant (inclusive).
    pub valid_until: Timestamp,
    /// Set by the authority; never cleared.
    pub cancelled: bool,
    /// When the cancellation was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<Timestamp>,
}

/// Variant discriminator with its terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialTerms {
    /// Long-lived identity credential.
    Passport(PassportTerms),
    /// Time-bounded authorization credential.
    Visa(VisaTerms),
}

impl CredentialTerms {
    /// Compute the terms for a credential issued at `issued_at`.
    ///
    /// Rejects a non-positive Visa duration, a negative start offset, and any
    /// window whose end cannot be represented.
    pub fn compute(issued_at: Timestamp, terms: IssueTerms) -> Result<Self, CredentialError> {
        match terms {
            IssueTerms::Passport => {
                let expires_at = issued_at
                    .checked_add_secs(PASSPORT_VALIDITY_SECS)
                    .ok_or_else(|| CredentialError::InvalidDuration {
                        reason: format!("passport issued at {issued_at} would expire out of range"),
                    })?;
                Ok(Self::Passport(PassportTerms { expires_at }))
            }
            IssueTerms::Visa {
                start_offset,
                duration,
            } => {
                if duration <= 0 {
                    return Err(CredentialError::InvalidDuration {
                        reason: format!("duration must be positive, got {duration}"),
                    });
                }
                if start_offset < 0 {
                    return Err(CredentialError::InvalidDuration {
                        reason: format!("start offset must not be negative, got {start_offset}"),
                    });
                }
                let valid_from = issued_at.checked_add_secs(start_offset).ok_or_else(|| {
                    CredentialError::InvalidDuration {
                        reason: format!("start offset {start_offset} overflows"),
                    }
                })?;
                let valid_until = valid_from.checked_add_secs(duration).ok_or_else(|| {
                    CredentialError::InvalidDuration {
                        reason: format!("duration {duration} overflows"),
                    }
                })?;
                Ok(Self::Visa(VisaTerms {
                    valid_from,
                    valid_duration: duration,
                    valid_until,
                    cancelled: false,
                    cancelled_at: None,
                }))
            }
        }
    }

    /// The variant discriminator.
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::Passport(_) => CredentialKind::Passport,
            Self::Visa(_) => CredentialKind::Visa,
        }
    }
}

// ─── Credential ──────────────────────────────────────────────────────

/// A live credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub(crate) id: CredentialId,
    pub(crate) holder: Identity,
    #[serde(default)]
    pub(crate) metadata_ref: String,
    pub(crate) issued_at: Timestamp,
    #[serde(flatten)]
    pub(crate) terms: CredentialTerms,
}

impl Credential {
    pub(crate) fn new(
        id: CredentialId,
        holder: Identity,
        metadata_ref: String,
        issued_at: Timestamp,
        terms: CredentialTerms,
    ) -> Self {
        Self {
            id,
            holder,
            metadata_ref,
            issued_at,
            terms,
        }
    }

    /// The credential id.
    pub fn id(&self) -> CredentialId {
        self.id
    }

    /// The identity the credential is bound to.
    pub fn holder(&self) -> &Identity {
        &self.holder
    }

    /// Opaque metadata reference (token URI), stored verbatim.
    pub fn metadata_ref(&self) -> &str {
        &self.metadata_ref
    }

    /// Issuance instant.
    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }

    /// Variant terms.
    pub fn terms(&self) -> &CredentialTerms {
        &self.terms
    }

    /// The variant discriminator.
    pub fn kind(&self) -> CredentialKind {
        self.terms.kind()
    }

    /// Last valid instant: `expires_at` for a Passport, `valid_until` for a Visa.
    pub fn expires_at(&self) -> Timestamp {
        match &self.terms {
            CredentialTerms::Passport(p) => p.expires_at,
            CredentialTerms::Visa(v) => v.valid_until,
        }
    }

    /// Inclusive validity window, ignoring cancellation.
    pub fn window(&self) -> crate::validity::ValidityWindow {
        crate::validity::window(self)
    }

    /// Whether this is a cancelled Visa. Passports are never cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(&self.terms, CredentialTerms::Visa(v) if v.cancelled)
    }

    /// Visa terms, or `WrongVariant` for a Passport.
    pub fn as_visa(&self) -> Result<&VisaTerms, CredentialError> {
        match &self.terms {
            CredentialTerms::Visa(v) => Ok(v),
            CredentialTerms::Passport(_) => Err(self.wrong_variant(CredentialKind::Visa)),
        }
    }

    /// Passport terms, or `WrongVariant` for a Visa.
    pub fn as_passport(&self) -> Result<&PassportTerms, CredentialError> {
        match &self.terms {
            CredentialTerms::Passport(p) => Ok(p),
            CredentialTerms::Visa(_) => Err(self.wrong_variant(CredentialKind::Passport)),
        }
    }

    pub(crate) fn wrong_variant(&self, expected: CredentialKind) -> CredentialError {
        CredentialError::WrongVariant {
            id: self.id,
            expected,
            actual: self.kind(),
        }
    }
}
