//! Property tests over the public lifecycle surface.

use std::sync::Arc;

use proptest::prelude::*;

use cryptonia_core::{CredentialError, Identity, ManualClock, Timestamp, PASSPORT_VALIDITY_SECS};
use cryptonia_state::{AuthorityConfig, EventKind, LifecycleService, MemorySink};

const AUTHORITY: &str = "0xauthority";

fn service_at(start: i64) -> (LifecycleService, Arc<ManualClock>, Arc<MemorySink>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_epoch_secs(start)));
    let sink = Arc::new(MemorySink::new());
    let service = LifecycleService::new(AuthorityConfig {
        authority: Identity::new(AUTHORITY).unwrap(),
    })
    .with_clock(clock.clone())
    .with_sink(sink.clone());
    (service, clock, sink)
}

fn authority() -> Identity {
    Identity::new(AUTHORITY).unwrap()
}

/// Identities that are never the authority and never the zero address.
fn non_authority() -> impl Strategy<Value = Identity> {
    "0x[1-9a-f][0-9a-f]{0,39}".prop_map(|s| Identity::new(s).unwrap())
}

fn ts(secs: i64) -> Timestamp {
    Timestamp::from_epoch_secs(secs)
}

proptest! {
    /// Nobody but the authority issues or cancels.
    #[test]
    fn non_authority_rejected(caller in non_authority(), holder in non_authority()) {
        let (service, _, sink) = service_at(0);
        let visa = service.issue_visa(&authority(), holder.clone(), 0, 10, "").unwrap();

        let err = service.issue_passport(&caller, holder.clone(), "").unwrap_err();
        prop_assert_eq!(err.code(), "UNAUTHORIZED");
        let err = service.issue_visa(&caller, holder.clone(), 0, 10, "").unwrap_err();
        prop_assert_eq!(err.code(), "UNAUTHORIZED");
        let err = service.cancel_visa(&caller, visa).unwrap_err();
        prop_assert_eq!(err.code(), "UNAUTHORIZED");

        prop_assert!(service.is_valid(visa, ts(5)));
        prop_assert_eq!(sink.len(), 1);
    }

    /// A holder never gets a second live Passport.
    #[test]
    fn duplicate_passport_rejected(holder in non_authority(), a in ".{0,20}", b in ".{0,20}") {
        let (service, _, _) = service_at(0);
        let first = service.issue_passport(&authority(), holder.clone(), a).unwrap();
        let err = service.issue_passport(&authority(), holder.clone(), b).unwrap_err();
        prop_assert_eq!(err, CredentialError::DuplicateHolder { holder: holder.clone(), existing: first });
        prop_assert_eq!(service.balance_of(&holder), 1);
    }

    /// Passport window is exactly [issued_at, issued_at + 10y].
    #[test]
    fn passport_window(issued in -1_000_000_000i64..4_000_000_000i64) {
        let (service, _, _) = service_at(issued);
        let id = service.issue_passport(&authority(), Identity::new("0xholder").unwrap(), "").unwrap();
        prop_assert!(!service.is_valid(id, ts(issued - 1)));
        prop_assert!(service.is_valid(id, ts(issued)));
        prop_assert!(service.is_valid(id, ts(issued + PASSPORT_VALIDITY_SECS)));
        prop_assert!(!service.is_valid(id, ts(issued + PASSPORT_VALIDITY_SECS + 1)));
    }

    /// Visa window is exactly [t0 + S, t0 + S + D].
    #[test]
    fn visa_window(
        t0 in 0i64..4_000_000_000i64,
        offset in 0i64..100_000_000i64,
        duration in 1i64..100_000_000i64,
    ) {
        let (service, _, _) = service_at(t0);
        let id = service
            .issue_visa(&authority(), Identity::new("0xholder").unwrap(), offset, duration, "")
            .unwrap();
        prop_assert!(!service.is_valid(id, ts(t0 + offset - 1)));
        prop_assert!(service.is_valid(id, ts(t0 + offset)));
        prop_assert!(service.is_valid(id, ts(t0 + offset + duration)));
        prop_assert!(!service.is_valid(id, ts(t0 + offset + duration + 1)));
    }

    /// Cancellation invalidates the Visa at every later instant.
    #[test]
    fn cancellation_is_permanent(
        offset in 0i64..1_000i64,
        duration in 1i64..1_000i64,
        cancel_at in 0i64..3_000i64,
        later in 0i64..10_000i64,
    ) {
        let (service, clock, _) = service_at(0);
        let id = service
            .issue_visa(&authority(), Identity::new("0xholder").unwrap(), offset, duration, "")
            .unwrap();
        clock.set(ts(cancel_at));
        service.cancel_visa(&authority(), id).unwrap();
        prop_assert!(!service.is_valid(id, ts(cancel_at + later)));
    }

    /// Transfers fail for any caller, the authority included.
    #[test]
    fn transfer_never_succeeds(
        holder in non_authority(),
        target in non_authority(),
        caller_is_authority in any::<bool>(),
        passport in any::<bool>(),
    ) {
        let (service, _, _) = service_at(0);
        let id = if passport {
            service.issue_passport(&authority(), holder.clone(), "").unwrap()
        } else {
            service.issue_visa(&authority(), holder.clone(), 0, 10, "").unwrap()
        };
        let caller = if caller_is_authority { authority() } else { holder.clone() };
        let err = service.transfer(&caller, &holder, &target, id).unwrap_err();
        prop_assert_eq!(err, CredentialError::NonTransferable { id });
        prop_assert_eq!(service.owner_of(id).unwrap(), holder);
    }

    /// Only the holder burns; afterwards the id is gone for good.
    #[test]
    fn burn_by_holder_only(holder in non_authority(), other in non_authority()) {
        prop_assume!(holder != other);
        let (service, _, sink) = service_at(0);
        let id = service.issue_passport(&authority(), holder.clone(), "").unwrap();

        prop_assert_eq!(service.burn_passport(&other, id).unwrap_err().code(), "UNAUTHORIZED");
        prop_assert_eq!(service.burn_passport(&authority(), id).unwrap_err().code(), "UNAUTHORIZED");
        service.burn_passport(&holder, id).unwrap();
        prop_assert_eq!(service.owner_of(id).unwrap_err().code(), "NOT_FOUND");

        let next = service.issue_passport(&authority(), holder.clone(), "").unwrap();
        prop_assert!(next > id);

        let kinds: Vec<_> = sink.events().iter().map(|e| e.kind).collect();
        prop_assert_eq!(kinds, vec![EventKind::Issued, EventKind::Burned, EventKind::Issued]);
    }
}
