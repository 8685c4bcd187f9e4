//! # Session
//!
//! One CLI invocation: the resolved configuration, the registry loaded from
//! the state directory, and a lifecycle service wired to the audit log.

use std::sync::Arc;

use anyhow::{Context, Result};

use cryptonia_core::{Clock, ManualClock, SystemClock, Timestamp};
use cryptonia_state::LifecycleService;

use crate::config::CliConfig;
use crate::store::{AuditLogSink, StateLock, StateStore};

/// Loaded state plus the service operating on it.
///
/// Holds the state directory lock for its whole lifetime, so no other
/// session can load the registry between this one's load and commit.
#[derive(Debug)]
pub struct Session {
    service: LifecycleService,
    store: StateStore,
    sink: Arc<AuditLogSink>,
    _lock: StateLock,
}

impl Session {
    /// Lock `config.state_dir` and load the registry from it.
    ///
    /// Blocks while another session holds the directory. `now` pins the
    /// clock; otherwise the system clock is used.
    pub fn open(config: &CliConfig, now: Option<Timestamp>) -> Result<Self> {
        let store = StateStore::new(&config.state_dir);
        let lock = store.lock()?;
        let registry = store.load()?;
        let clock: Arc<dyn Clock> = match now {
            Some(at) => Arc::new(ManualClock::new(at)),
            None => Arc::new(SystemClock),
        };
        let sink = Arc::new(AuditLogSink::new());
        let service = LifecycleService::new(config.authority_config())
            .with_clock(clock)
            .with_sink(sink.clone())
            .with_registry(registry);
        tracing::debug!(state_dir = %store.dir().display(), now = %service.now(), "session opened");
        Ok(Self {
            service,
            store,
            sink,
            _lock: lock,
        })
    }

    /// The lifecycle service for this invocation.
    pub fn service(&self) -> &LifecycleService {
        &self.service
    }

    /// The backing store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Persist the registry, then the events it produced.
    ///
    /// Does nothing if no mutation committed.
    pub fn commit(&self) -> Result<()> {
        let events = self.sink.drain();
        if events.is_empty() {
            return Ok(());
        }
        self.store
            .save(&self.service.snapshot())
            .context("failed to save registry")?;
        self.store
            .append_events(&events)
            .context("failed to write audit log")?;
        Ok(())
    }
}
