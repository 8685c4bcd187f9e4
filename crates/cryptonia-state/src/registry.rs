//! # Credential Registry
//!
//! The data-model core: live credential records keyed by id, plus a
//! secondary `holder -> live Passport id` index backing the one-Passport
//! rule.
//!
//! ## Invariants
//!
//! - Ids are allocated from 1 upward and never reassigned, burned ids
//!   included.
//! - No live record is held by the zero identity.
//! - At most one live Passport per holder; the index always agrees with
//!   the records.
//! - A record's holder never changes. Records enter through `create` and
//!   leave through `remove`.
//!
//! The registry is a plain single-threaded structure that validates every
//! precondition before touching state. Serializing access across threads
//! is the lifecycle service's job.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cryptonia_core::{CredentialError, CredentialId, CredentialKind, Identity, Timestamp};

use crate::credential::{Credential, CredentialTerms, IssueTerms};
use crate::events::{EventKind, LifecycleEvent};

// ─── Snapshot ────────────────────────────────────────────────────────

/// Persisted registry layout: records keyed by id plus the id allocator.
///
/// The holder index is derived and rebuilt on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Next id to allocate; 0 marks an exhausted id space.
    pub next_id: u64,
    /// Live credentials in ascending id order.
    pub credentials: Vec<Credential>,
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Self {
            next_id: CredentialId::FIRST.get(),
            credentials: Vec::new(),
        }
    }
}

/// A snapshot that violates a registry invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Two records share one id.
    #[error("duplicate credential id {0} in snapshot")]
    DuplicateId(CredentialId),

    /// A record's id was never allocated by the recorded allocator.
    #[error("credential id {id} is not below next_id {next_id}")]
    UnallocatedId {
        /// Offending id.
        id: CredentialId,
        /// Allocator position in the snapshot.
        next_id: u64,
    },

    /// A holder has more than one live Passport.
    #[error("{holder} holds passports {first} and {second}")]
    DuplicatePassport {
        /// The holder.
        holder: Identity,
        /// First Passport found.
        first: CredentialId,
        /// Second Passport found.
        second: CredentialId,
    },

    /// A record is held by the zero identity.
    #[error("credential {0} is held by the zero identity")]
    ZeroHolder(CredentialId),

    /// Stored window does not match the one recomputed from its inputs.
    #[error("credential {0} has an inconsistent validity window")]
    InconsistentWindow(CredentialId),
}

// ─── Registry ────────────────────────────────────────────────────────

/// Live credential records and the id allocator.
#[derive(Debug, Clone)]
pub struct CredentialRegistry {
    records: BTreeMap<CredentialId, Credential>,
    passport_index: HashMap<Identity, CredentialId>,
    /// 0 once the id space is exhausted.
    next_id: u64,
}

impl Default for CredentialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialRegistry {
    /// An empty registry whose first id is 1.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            passport_index: HashMap::new(),
            next_id: CredentialId::FIRST.get(),
        }
    }

    /// Restore a registry, rejecting snapshots that break an invariant.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self, SnapshotError> {
        let mut registry = Self {
            records: BTreeMap::new(),
            passport_index: HashMap::new(),
            next_id: snapshot.next_id,
        };
        for credential in snapshot.credentials {
            let id = credential.id();
            if snapshot.next_id != 0 && id.get() >= snapshot.next_id {
                return Err(SnapshotError::UnallocatedId {
                    id,
                    next_id: snapshot.next_id,
                });
            }
            if credential.holder().is_zero() {
                return Err(SnapshotError::ZeroHolder(id));
            }
            let recomputed = recompute_terms(&credential);
            if recomputed.as_ref() != Some(credential.terms()) {
                return Err(SnapshotError::InconsistentWindow(id));
            }
            if credential.kind() == CredentialKind::Passport {
                if let Some(&first) = registry.passport_index.get(credential.holder()) {
                    return Err(SnapshotError::DuplicatePassport {
                        holder: credential.holder().clone(),
                        first,
                        second: id,
                    });
                }
                registry
                    .passport_index
                    .insert(credential.holder().clone(), id);
            }
            if registry.records.insert(id, credential).is_some() {
                return Err(SnapshotError::DuplicateId(id));
            }
        }
        Ok(registry)
    }

    /// Capture the persisted layout.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            next_id: self.next_id,
            credentials: self.records.values().cloned().collect(),
        }
    }

    /// Create and store a credential for `holder`.
    ///
    /// # Errors
    ///
    /// - `InvalidHolder` for the zero identity.
    /// - `DuplicateHolder` if a Passport is requested for a holder that
    ///   already holds a live one.
    /// - `InvalidDuration` for unusable Visa terms.
    /// - `IdsExhausted` once every id has been handed out.
    pub fn create(
        &mut self,
        holder: Identity,
        metadata_ref: String,
        issued_at: Timestamp,
        terms: IssueTerms,
    ) -> Result<(CredentialId, LifecycleEvent), CredentialError> {
        if holder.is_zero() {
            return Err(CredentialError::InvalidHolder { holder });
        }
        if let IssueTerms::Passport = terms {
            if let Some(&existing) = self.passport_index.get(&holder) {
                return Err(CredentialError::DuplicateHolder { holder, existing });
            }
        }
        let terms = CredentialTerms::compute(issued_at, terms)?;
        let id = CredentialId::new(self.next_id).ok_or(CredentialError::IdsExhausted)?;

        // All checks passed; commit.
        self.next_id = id.successor().map_or(0, |next| next.get());
        let kind = terms.kind();
        if kind == CredentialKind::Passport {
            self.passport_index.insert(holder.clone(), id);
        }
        let event = LifecycleEvent {
            kind: EventKind::Issued,
            id,
            holder: holder.clone(),
            variant: kind,
            timestamp: issued_at,
        };
        self.records
            .insert(id, Credential::new(id, holder, metadata_ref, issued_at, terms));
        Ok((id, event))
    }

    /// Look up a live credential.
    pub fn get(&self, id: CredentialId) -> Result<&Credential, CredentialError> {
        self.records
            .get(&id)
            .ok_or(CredentialError::NotFound { id })
    }

    /// The holder of a live credential.
    pub fn owner_of(&self, id: CredentialId) -> Result<Identity, CredentialError> {
        self.get(id).map(|c| c.holder().clone())
    }

    /// Delete a credential, retiring its id for good.
    pub fn remove(
        &mut self,
        id: CredentialId,
        at: Timestamp,
    ) -> Result<(Credential, LifecycleEvent), CredentialError> {
        let credential = self
            .records
            .remove(&id)
            .ok_or(CredentialError::NotFound { id })?;
        if credential.kind() == CredentialKind::Passport {
            self.passport_index.remove(credential.holder());
        }
        let event = LifecycleEvent {
            kind: EventKind::Burned,
            id,
            holder: credential.holder().clone(),
            variant: credential.kind(),
            timestamp: at,
        };
        Ok((credential, event))
    }

    /// Mark a Visa cancelled.
    ///
    /// Returns `Ok(None)` if the Visa was already cancelled: the flag is
    /// monotonic and the first cancellation time is kept.
    pub fn set_cancelled(
        &mut self,
        id: CredentialId,
        at: Timestamp,
    ) -> Result<Option<LifecycleEvent>, CredentialError> {
        let credential = self
            .records
            .get_mut(&id)
            .ok_or(CredentialError::NotFound { id })?;
        let holder = credential.holder.clone();
        let CredentialTerms::Visa(visa) = &mut credential.terms else {
            return Err(CredentialError::WrongVariant {
                id,
                expected: CredentialKind::Visa,
                actual: CredentialKind::Passport,
            });
        };
        if visa.cancelled {
            return Ok(None);
        }
        visa.cancelled = true;
        visa.cancelled_at = Some(at);
        Ok(Some(LifecycleEvent {
            kind: EventKind::Cancelled,
            id,
            holder,
            variant: CredentialKind::Visa,
            timestamp: at,
        }))
    }

    /// The live Passport held by `holder`, if any.
    pub fn passport_of(&self, holder: &Identity) -> Option<CredentialId> {
        self.passport_index.get(holder).copied()
    }

    /// Every live credential held by `holder`, in id order.
    pub fn credentials_of<'a>(
        &'a self,
        holder: &'a Identity,
    ) -> impl Iterator<Item = &'a Credential> + 'a {
        self.records.values().filter(move |c| c.holder() == holder)
    }

    /// Number of live credentials held by `holder`.
    pub fn balance_of(&self, holder: &Identity) -> usize {
        self.credentials_of(holder).count()
    }

    /// Live credentials in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.records.values()
    }

    /// Number of live credentials.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no credential is live.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The id the next issuance will receive, or `None` when exhausted.
    pub fn next_id(&self) -> Option<CredentialId> {
        CredentialId::new(self.next_id)
    }

    /// Count of ids ever allocated, burned ones included.
    pub fn total_issued(&self) -> u64 {
        match self.next_id {
            0 => u64::MAX,
            n => n - 1,
        }
    }
}

/// Recompute a stored credential's terms from its issuance inputs.
fn recompute_terms(credential: &Credential) -> Option<CredentialTerms> {
    match credential.terms() {
        CredentialTerms::Passport(_) => {
            CredentialTerms::compute(credential.issued_at(), IssueTerms::Passport).ok()
        }
        CredentialTerms::Visa(stored) => {
            let start_offset = stored
                .valid_from
                .epoch_secs()
                .checked_sub(credential.issued_at().epoch_secs())?;
            let mut terms = CredentialTerms::compute(
                credential.issued_at(),
                IssueTerms::Visa {
                    start_offset,
                    duration: stored.valid_duration,
                },
            )
            .ok()?;
            if stored.cancelled_at.is_some() && !stored.cancelled {
                return None;
            }
            if let CredentialTerms::Visa(v) = &mut terms {
                v.cancelled = stored.cancelled;
                v.cancelled_at = stored.cancelled_at;
            }
            Some(terms)
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
