//! Serialization of concurrent lifecycle operations.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use cryptonia_core::{CredentialError, Identity, ManualClock, Timestamp};
use cryptonia_state::{AuthorityConfig, ChannelSink, EventKind, LifecycleService, MemorySink};

fn service(sink: Arc<MemorySink>) -> Arc<LifecycleService> {
    Arc::new(
        LifecycleService::new(AuthorityConfig {
            authority: Identity::new("0xauthority").unwrap(),
        })
        .with_clock(Arc::new(ManualClock::new(Timestamp::from_epoch_secs(1_000))))
        .with_sink(sink),
    )
}

#[test]
fn racing_passport_issuance_has_one_winner() {
    let sink = Arc::new(MemorySink::new());
    let service = service(sink.clone());
    let authority = Identity::new("0xauthority").unwrap();
    let holder = Identity::new("0xholder").unwrap();

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = &service;
                let authority = &authority;
                let holder = holder.clone();
                s.spawn(move || service.issue_passport(authority, holder, format!("ipfs://{i}")))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    let winner = *winners[0];
    for r in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(
            *r,
            CredentialError::DuplicateHolder {
                holder: holder.clone(),
                existing: winner
            }
        );
    }
    assert_eq!(sink.len(), 1);
    assert_eq!(service.balance_of(&holder), 1);
}

#[test]
fn concurrent_issuance_allocates_unique_ids() {
    let sink = Arc::new(MemorySink::new());
    let service = service(sink.clone());
    let authority = Identity::new("0xauthority").unwrap();

    let ids: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let service = &service;
                let authority = &authority;
                s.spawn(move || {
                    let holder = Identity::new(format!("0xholder{i}")).unwrap();
                    service.issue_visa(authority, holder, 0, 60, "").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: BTreeSet<_> = ids.iter().map(|id| id.get()).collect();
    assert_eq!(unique.len(), 32);
    assert_eq!(unique.first(), Some(&1));
    assert_eq!(unique.last(), Some(&32));

    // Events leave in commit order, so their ids are strictly increasing.
    let emitted: Vec<_> = sink.events().iter().map(|e| e.id.get()).collect();
    assert!(emitted.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn readers_never_see_partial_burns() {
    let sink = Arc::new(MemorySink::new());
    let service = service(sink);
    let authority = Identity::new("0xauthority").unwrap();
    let holders: Vec<_> = (0..64)
        .map(|i| Identity::new(format!("0xh{i}")).unwrap())
        .collect();
    let ids: Vec<_> = holders
        .iter()
        .map(|h| service.issue_passport(&authority, h.clone(), "").unwrap())
        .collect();

    thread::scope(|s| {
        let service = &service;
        let ids = &ids;
        let holders = &holders;
        s.spawn(move || {
            for (id, holder) in ids.iter().zip(holders) {
                service.burn_passport(holder, *id).unwrap();
            }
        });
        for _ in 0..4 {
            s.spawn(move || {
                for _ in 0..200 {
                    service.read(|registry| {
                        // A burned Passport is gone from records and index together.
                        for (id, holder) in ids.iter().zip(holders) {
                            let live = registry.get(*id).is_ok();
                            assert_eq!(live, registry.passport_of(holder) == Some(*id));
                        }
                    });
                }
            });
        }
    });

    assert_eq!(service.read(|r| r.len()), 0);
}

#[tokio::test]
async fn channel_sink_streams_events_to_async_consumer() {
    let (sink, mut rx) = ChannelSink::new();
    let service = LifecycleService::new(AuthorityConfig {
        authority: Identity::new("0xauthority").unwrap(),
    })
    .with_clock(Arc::new(ManualClock::new(Timestamp::from_epoch_secs(0))))
    .with_sink(Arc::new(sink));
    let authority = Identity::new("0xauthority").unwrap();
    let holder = Identity::new("0xholder").unwrap();

    let visa = service
        .issue_visa(&authority, holder.clone(), 0, 100, "")
        .unwrap();
    service.cancel_visa(&authority, visa).unwrap();
    drop(service);

    let mut kinds = Vec::new();
    while let Some(event) = rx.recv().await {
        kinds.push(event.kind);
    }
    assert_eq!(kinds, vec![EventKind::Issued, EventKind::Cancelled]);
}
