//! # Access Control
//!
//! One authority identity, fixed when the service is built. It alone may
//! issue Passports and Visas and cancel Visas. Burning a Passport is gated
//! on the holder instead; the authority has no burn right.

use serde::{Deserialize, Serialize};

use cryptonia_core::{CredentialError, Identity, Role};

use crate::credential::Credential;

/// Process-wide authority configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// The issuing authority.
    pub authority: Identity,
}

/// Role checks for lifecycle operations.
#[derive(Debug, Clone)]
pub struct AccessControl {
    authority: Identity,
}

impl AccessControl {
    /// Build from the startup configuration. There is no setter.
    pub fn new(config: AuthorityConfig) -> Self {
        Self {
            authority: config.authority,
        }
    }

    /// The configured authority.
    pub fn authority(&self) -> &Identity {
        &self.authority
    }

    /// Reject unless `caller` is the authority.
    pub fn require_authority(&self, caller: &Identity) -> Result<(), CredentialError> {
        if *caller == self.authority {
            Ok(())
        } else {
            Err(CredentialError::Unauthorized {
                caller: caller.clone(),
                role: Role::Authority,
            })
        }
    }

    /// Reject unless `caller` holds `credential`.
    pub fn require_holder(
        &self,
        caller: &Identity,
        credential: &Credential,
    ) -> Result<(), CredentialError> {
        if caller == credential.holder() {
            Ok(())
        } else {
            Err(CredentialError::Unauthorized {
                caller: caller.clone(),
                role: Role::Holder,
            })
        }
    }
}
