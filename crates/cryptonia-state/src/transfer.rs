//! # Transfer Guard
//!
//! Every attempted change of a credential's holder is described as a
//! [`HolderChange`] and checked here before it reaches the registry.
//!
//! | Change     | Outcome                                   |
//! |------------|-------------------------------------------|
//! | `Mint`     | allowed (caller role checked separately)  |
//! | `Burn`     | allowed for Passports only                |
//! | `Transfer` | always `NonTransferable`                  |
//!
//! There is no override. The authority is refused a transfer exactly like
//! anyone else.

use cryptonia_core::{CredentialError, CredentialId, CredentialKind, Identity};

/// An attempted change to who holds a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolderChange<'a> {
    /// Issuance of a new credential to `to`.
    Mint {
        /// Recipient.
        to: &'a Identity,
    },
    /// Destruction of a live credential by its holder.
    Burn {
        /// Credential to destroy.
        id: CredentialId,
        /// Its variant.
        variant: CredentialKind,
    },
    /// Any other movement from one identity to another.
    Transfer {
        /// Credential to move.
        id: CredentialId,
        /// Claimed current holder.
        from: &'a Identity,
        /// Intended recipient.
        to: &'a Identity,
    },
}

/// Stateless policy over [`HolderChange`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferGuard;

impl TransferGuard {
    /// Allow or reject a holder change.
    pub fn check(&self, change: &HolderChange<'_>) -> Result<(), CredentialError> {
        match change {
            HolderChange::Mint { .. } => Ok(()),
            HolderChange::Burn {
                variant: CredentialKind::Passport,
                ..
            } => Ok(()),
            HolderChange::Burn {
                id,
                variant: CredentialKind::Visa,
            } => Err(CredentialError::WrongVariant {
                id: *id,
                expected: CredentialKind::Passport,
                actual: CredentialKind::Visa,
            }),
            HolderChange::Transfer { id, from, to } => {
                tracing::warn!(id = id.get(), %from, %to, "rejected credential transfer");
                Err(CredentialError::NonTransferable { id: *id })
            }
        }
    }
}
