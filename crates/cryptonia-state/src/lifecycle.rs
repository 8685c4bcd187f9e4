//! # Lifecycle Service
//!
//! The public façade over access control, the transfer guard, the registry
//! and the validity engine.
//!
//! ## Operations
//!
//! | Operation        | Gate                         | Mutation                |
//! |------------------|------------------------------|-------------------------|
//! | `issue_passport` | authority, mint              | create Passport         |
//! | `burn_passport`  | Passport variant, holder     | remove                  |
//! | `issue_visa`     | authority, mint              | create Visa             |
//! | `cancel_visa`    | authority                    | set cancelled           |
//! | `transfer`       | always rejected              | none                    |
//!
//! ## Concurrency
//!
//! The registry sits behind one `parking_lot::RwLock`. A mutation holds the
//! write lock from its first check until its event has been emitted, so
//! check-then-act is atomic and events leave in commit order. Queries share
//! the read lock and see either all of a mutation or none of it.

use std::sync::Arc;

use parking_lot::RwLock;

use cryptonia_core::{Clock, CredentialError, CredentialId, Identity, SystemClock, Timestamp};

use crate::access::{AccessControl, AuthorityConfig};
use crate::credential::{Credential, IssueTerms};
use crate::events::{EventSink, TracingSink};
use crate::registry::{CredentialRegistry, RegistrySnapshot};
use crate::transfer::{HolderChange, TransferGuard};
use crate::validity::{self, ValidityStatus};

/// Thread-safe credential lifecycle service for one issuing authority.
pub struct LifecycleService {
    access: AccessControl,
    guard: TransferGuard,
    registry: RwLock<CredentialRegistry>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for LifecycleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleService")
            .field("authority", self.access.authority())
            .field("live_credentials", &self.registry.read().len())
            .field("clock", &"[dyn Clock]")
            .field("sink", &"[dyn EventSink]")
            .finish()
    }
}

impl LifecycleService {
    /// An empty service on the system clock, auditing through `tracing`.
    pub fn new(config: AuthorityConfig) -> Self {
        Self {
            access: AccessControl::new(config),
            guard: TransferGuard,
            registry: RwLock::new(CredentialRegistry::new()),
            clock: Arc::new(SystemClock),
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Start from previously persisted state.
    pub fn with_registry(mut self, registry: CredentialRegistry) -> Self {
        self.registry = RwLock::new(registry);
        self
    }

    /// The configured authority.
    pub fn authority(&self) -> &Identity {
        self.access.authority()
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Issue a Passport to `holder`. Authority only.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `DuplicateHolder`, `InvalidHolder`.
    pub fn issue_passport(
        &self,
        caller: &Identity,
        holder: Identity,
        metadata_ref: impl Into<String>,
    ) -> Result<CredentialId, CredentialError> {
        self.issue(caller, holder, metadata_ref.into(), IssueTerms::Passport)
            .map_err(|e| rejected("issue_passport", caller, e))
    }

    /// Issue a Visa valid from `start_offset` seconds after now for
    /// `duration` seconds. Authority only.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InvalidDuration`, `InvalidHolder`.
    pub fn issue_visa(
        &self,
        caller: &Identity,
        holder: Identity,
        start_offset: i64,
        duration: i64,
        metadata_ref: impl Into<String>,
    ) -> Result<CredentialId, CredentialError> {
        let terms = IssueTerms::Visa {
            start_offset,
            duration,
        };
        self.issue(caller, holder, metadata_ref.into(), terms)
            .map_err(|e| rejected("issue_visa", caller, e))
    }

    fn issue(
        &self,
        caller: &Identity,
        holder: Identity,
        metadata_ref: String,
        terms: IssueTerms,
    ) -> Result<CredentialId, CredentialError> {
        self.access.require_authority(caller)?;
        self.guard.check(&HolderChange::Mint { to: &holder })?;

        let mut registry = self.registry.write();
        let now = self.clock.now();
        let (id, event) = registry.create(holder, metadata_ref, now, terms)?;
        self.sink.emit(&event);
        tracing::debug!(id = id.get(), variant = %event.variant, holder = %event.holder, "issued credential");
        Ok(id)
    }

    /// Burn a Passport. Only its holder may do this; Visas cannot be burned.
    ///
    /// # Errors
    ///
    /// `NotFound`, `WrongVariant`, `Unauthorized`.
    pub fn burn_passport(&self, caller: &Identity, id: CredentialId) -> Result<(), CredentialError> {
        self.burn(caller, id)
            .map_err(|e| rejected("burn_passport", caller, e))
    }

    fn burn(&self, caller: &Identity, id: CredentialId) -> Result<(), CredentialError> {
        let mut registry = self.registry.write();
        let credential = registry.get(id)?;
        self.guard.check(&HolderChange::Burn {
            id,
            variant: credential.kind(),
        })?;
        self.access.require_holder(caller, credential)?;

        let (_, event) = registry.remove(id, self.clock.now())?;
        self.sink.emit(&event);
        tracing::debug!(id = id.get(), holder = %event.holder, "burned passport");
        Ok(())
    }

    /// Cancel a Visa. Authority only; cancelling twice is a no-op.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `WrongVariant`.
    pub fn cancel_visa(&self, caller: &Identity, id: CredentialId) -> Result<(), CredentialError> {
        self.cancel(caller, id)
            .map_err(|e| rejected("cancel_visa", caller, e))
    }

    fn cancel(&self, caller: &Identity, id: CredentialId) -> Result<(), CredentialError> {
        self.access.require_authority(caller)?;

        let mut registry = self.registry.write();
        match registry.set_cancelled(id, self.clock.now())? {
            Some(event) => {
                self.sink.emit(&event);
                tracing::debug!(id = id.get(), holder = %event.holder, "cancelled visa");
            }
            None => tracing::debug!(id = id.get(), "visa already cancelled"),
        }
        Ok(())
    }

    /// Attempt to move a credential between identities.
    ///
    /// Credentials are bound to their holder: this fails with
    /// `NonTransferable` for every caller, the authority included.
    pub fn transfer(
        &self,
        caller: &Identity,
        from: &Identity,
        to: &Identity,
        id: CredentialId,
    ) -> Result<(), CredentialError> {
        self.guard
            .check(&HolderChange::Transfer { id, from, to })
            .map_err(|e| rejected("transfer", caller, e))
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Whether credential `id` is valid at `now`. Unknown or burned ids are
    /// not valid.
    pub fn is_valid(&self, id: CredentialId, now: Timestamp) -> bool {
        let registry = self.registry.read();
        validity::is_valid_opt(registry.get(id).ok(), now)
    }

    /// [`Self::is_valid`] at the clock's current time.
    pub fn is_valid_now(&self, id: CredentialId) -> bool {
        self.is_valid(id, self.clock.now())
    }

    /// Lifecycle classification at `now`, or `None` for an unknown id.
    pub fn status(&self, id: CredentialId, now: Timestamp) -> Option<ValidityStatus> {
        let registry = self.registry.read();
        registry.get(id).ok().map(|c| validity::status(c, now))
    }

    /// Holder of a live credential.
    pub fn owner_of(&self, id: CredentialId) -> Result<Identity, CredentialError> {
        self.registry.read().owner_of(id)
    }

    /// Copy of a live credential record.
    pub fn credential(&self, id: CredentialId) -> Result<Credential, CredentialError> {
        self.registry.read().get(id).cloned()
    }

    /// The opaque metadata reference (token URI) of a live credential.
    pub fn metadata_ref(&self, id: CredentialId) -> Result<String, CredentialError> {
        self.registry
            .read()
            .get(id)
            .map(|c| c.metadata_ref().to_string())
    }

    /// Issuance instant of a live credential.
    pub fn issued_at(&self, id: CredentialId) -> Result<Timestamp, CredentialError> {
        self.registry.read().get(id).map(Credential::issued_at)
    }

    /// Last valid instant of a live credential.
    pub fn expires_at(&self, id: CredentialId) -> Result<Timestamp, CredentialError> {
        self.registry.read().get(id).map(Credential::expires_at)
    }

    /// Number of live credentials held by `holder`.
    pub fn balance_of(&self, holder: &Identity) -> usize {
        self.registry.read().balance_of(holder)
    }

    /// The live Passport of `holder`, if any.
    pub fn passport_of(&self, holder: &Identity) -> Option<CredentialId> {
        self.registry.read().passport_of(holder)
    }

    /// Run `f` against one consistent view of the registry.
    pub fn read<R>(&self, f: impl FnOnce(&CredentialRegistry) -> R) -> R {
        f(&self.registry.read())
    }

    /// Capture the persisted layout.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.read().snapshot()
    }
}

/// Log a rejected operation and pass the error through.
fn rejected(op: &'static str, caller: &Identity, err: CredentialError) -> CredentialError {
    match &err {
        CredentialError::Unauthorized { .. } | CredentialError::NonTransferable { .. } => {
            tracing::warn!(op, %caller, code = err.code(), "{err}");
        }
        _ => tracing::debug!(op, %caller, code = err.code(), "{err}"),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, MemorySink};
    use cryptonia_core::{CredentialKind, ManualClock, Role};

    struct Harness {
        service: LifecycleService,
        clock: Arc<ManualClock>,
        sink: Arc<MemorySink>,
        authority: Identity,
        holder: Identity,
    }

    fn who(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs)
    }

    fn harness(start: i64) -> Harness {
        let clock = Arc::new(ManualClock::new(ts(start)));
        let sink = Arc::new(MemorySink::new());
        let authority = who("0xauthority");
        let service = LifecycleService::new(AuthorityConfig {
            authority: authority.clone(),
        })
        .with_clock(clock.clone())
        .with_sink(sink.clone());
        Harness {
            service,
            clock,
            sink,
            authority,
            holder: who("0x7e6e41BA05FdBE4e1617cfB521154550537255df"),
        }
    }

    #[test]
    fn authority_mints_passport_for_user() {
        let h = harness(0);
        let id = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        assert_eq!(id.get(), 1);
        assert_eq!(h.service.owner_of(id).unwrap(), h.holder);
        assert_eq!(h.service.balance_of(&h.holder), 1);
    }

    #[test]
    fn passport_mint_emits_issued_event() {
        let h = harness(77);
        let id = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "ipfs://p")
            .unwrap();
        let events = h.sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Issued);
        assert_eq!(events[0].id, id);
        assert_eq!(events[0].variant, CredentialKind::Passport);
        assert_eq!(events[0].timestamp, ts(77));
    }

    #[test]
    fn user_cannot_mint() {
        let h = harness(0);
        let err = h
            .service
            .issue_passport(&h.holder, h.holder.clone(), "")
            .unwrap_err();
        assert!(matches!(
            err,
            CredentialError::Unauthorized {
                role: Role::Authority,
                ..
            }
        ));
        let err = h
            .service
            .issue_visa(&h.holder, h.holder.clone(), 1, 2_592_000, "")
            .unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
        assert!(h.sink.is_empty());
    }

    #[test]
    fn passport_window_concrete_scenario() {
        let h = harness(1_000);
        let id = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        assert!(h.service.is_valid_now(id));
        assert!(h.service.is_valid(id, ts(1_000 + 315_360_000)));
        assert!(!h.service.is_valid(id, ts(1_000 + 315_360_000 + 1)));
        assert_eq!(h.service.issued_at(id).unwrap(), ts(1_000));
        assert_eq!(h.service.expires_at(id).unwrap(), ts(1_000 + 315_360_000));
    }

    #[test]
    fn passport_validity_follows_clock() {
        let h = harness(0);
        let id = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        h.clock.advance(315_360_000);
        assert!(h.service.is_valid_now(id));
        h.clock.advance(1);
        assert!(!h.service.is_valid_now(id));
    }

    #[test]
    fn holder_burns_passport() {
        let h = harness(0);
        let id = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        h.clock.advance(5);
        h.service.burn_passport(&h.holder, id).unwrap();
        assert!(matches!(
            h.service.owner_of(id),
            Err(CredentialError::NotFound { .. })
        ));
        assert!(!h.service.is_valid_now(id));
        let events = h.sink.events();
        assert_eq!(events[1].kind, EventKind::Burned);
        assert_eq!(events[1].timestamp, ts(5));
    }

    #[test]
    fn only_holder_can_burn() {
        let h = harness(0);
        let id = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        let err = h.service.burn_passport(&h.authority, id).unwrap_err();
        assert!(matches!(
            err,
            CredentialError::Unauthorized {
                role: Role::Holder,
                ..
            }
        ));
        assert_eq!(h.service.owner_of(id).unwrap(), h.holder);
    }

    #[test]
    fn burn_unknown_is_not_found() {
        let h = harness(0);
        assert_eq!(
            h.service
                .burn_passport(&h.holder, CredentialId::FIRST)
                .unwrap_err()
                .code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn visa_cannot_be_burned() {
        let h = harness(0);
        let id = h
            .service
            .issue_visa(&h.authority, h.holder.clone(), 0, 100, "")
            .unwrap();
        let err = h.service.burn_passport(&h.holder, id).unwrap_err();
        assert_eq!(err.code(), "WRONG_VARIANT");
        assert_eq!(h.service.owner_of(id).unwrap(), h.holder);
    }

    #[test]
    fn second_passport_rejected_until_burned() {
        let h = harness(0);
        let first = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "a")
            .unwrap();
        let err = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "b")
            .unwrap_err();
        assert_eq!(
            err,
            CredentialError::DuplicateHolder {
                holder: h.holder.clone(),
                existing: first
            }
        );
        h.service.burn_passport(&h.holder, first).unwrap();
        let second = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "b")
            .unwrap();
        assert_eq!(second.get(), 2);
        assert_eq!(h.service.passport_of(&h.holder), Some(second));
    }

    #[test]
    fn visa_window_concrete_scenario() {
        let h = harness(0);
        let id = h
            .service
            .issue_visa(&h.authority, h.holder.clone(), 604_800, 2_592_000, "")
            .unwrap();
        assert_eq!(id.get(), 1);
        assert!(!h.service.is_valid(id, ts(604_799)));
        assert!(h.service.is_valid(id, ts(604_800)));
        assert!(h.service.is_valid(id, ts(3_196_800)));
        assert!(!h.service.is_valid(id, ts(3_196_801)));

        h.clock.set(ts(1_000_000));
        h.service.cancel_visa(&h.authority, id).unwrap();
        assert!(!h.service.is_valid(id, ts(1_000_001)));
        assert_eq!(
            h.service.status(id, ts(1_000_001)),
            Some(ValidityStatus::Cancelled)
        );
    }

    #[test]
    fn visa_invalid_duration() {
        let h = harness(0);
        for duration in [0, -5] {
            let err = h
                .service
                .issue_visa(&h.authority, h.holder.clone(), 0, duration, "")
                .unwrap_err();
            assert_eq!(err.code(), "INVALID_DURATION");
        }
        assert!(h.sink.is_empty());
    }

    #[test]
    fn only_authority_cancels() {
        let h = harness(0);
        let id = h
            .service
            .issue_visa(&h.authority, h.holder.clone(), 0, 100, "")
            .unwrap();
        let err = h.service.cancel_visa(&h.holder, id).unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
        assert!(h.service.is_valid_now(id));
    }

    #[test]
    fn cancel_emits_once() {
        let h = harness(0);
        let id = h
            .service
            .issue_visa(&h.authority, h.holder.clone(), 0, 100, "")
            .unwrap();
        h.service.cancel_visa(&h.authority, id).unwrap();
        h.service.cancel_visa(&h.authority, id).unwrap();
        let kinds: Vec<_> = h.sink.events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Issued, EventKind::Cancelled]);
    }

    #[test]
    fn cancel_passport_is_wrong_variant() {
        let h = harness(0);
        let id = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        assert_eq!(
            h.service.cancel_visa(&h.authority, id).unwrap_err().code(),
            "WRONG_VARIANT"
        );
    }

    #[test]
    fn cancel_unknown_is_not_found() {
        let h = harness(0);
        assert_eq!(
            h.service
                .cancel_visa(&h.authority, CredentialId::FIRST)
                .unwrap_err()
                .code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn transfers_rejected_for_everyone() {
        let h = harness(0);
        let passport = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        let visa = h
            .service
            .issue_visa(&h.authority, h.holder.clone(), 0, 100, "")
            .unwrap();
        for id in [passport, visa] {
            for caller in [&h.holder, &h.authority] {
                let err = h
                    .service
                    .transfer(caller, &h.holder, &h.authority, id)
                    .unwrap_err();
                assert_eq!(err, CredentialError::NonTransferable { id });
            }
            assert_eq!(h.service.owner_of(id).unwrap(), h.holder);
        }
        assert_eq!(h.sink.len(), 2);
    }

    #[test]
    fn metadata_ref_stored_verbatim() {
        let h = harness(0);
        let id = h
            .service
            .issue_visa(&h.authority, h.holder.clone(), 0, 1, "ipfs://Qm weird ✓")
            .unwrap();
        assert_eq!(h.service.metadata_ref(id).unwrap(), "ipfs://Qm weird ✓");
    }

    #[test]
    fn unknown_id_queries() {
        let h = harness(0);
        let id = CredentialId::new(42).unwrap();
        assert!(!h.service.is_valid(id, ts(0)));
        assert_eq!(h.service.status(id, ts(0)), None);
        assert!(h.service.credential(id).is_err());
        assert!(h.service.metadata_ref(id).is_err());
    }

    #[test]
    fn restored_registry_continues_numbering() {
        let h = harness(0);
        let id = h
            .service
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        h.service.burn_passport(&h.holder, id).unwrap();
        let snapshot = h.service.snapshot();

        let restored = LifecycleService::new(AuthorityConfig {
            authority: h.authority.clone(),
        })
        .with_clock(h.clock.clone())
        .with_sink(Arc::new(MemorySink::new()))
        .with_registry(CredentialRegistry::from_snapshot(snapshot).unwrap());
        let next = restored
            .issue_passport(&h.authority, h.holder.clone(), "")
            .unwrap();
        assert_eq!(next.get(), 2);
    }
}
