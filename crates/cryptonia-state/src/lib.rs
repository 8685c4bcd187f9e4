//! # cryptonia-state: Credential Lifecycle
//!
//! Issues and validates two classes of non-transferable credentials on
//! behalf of a single issuing authority.
//!
//! ## Components
//!
//! - **Credential** (`credential.rs`): tagged union of Passport and Visa
//!   terms over the shared id, holder, metadata and issuance fields.
//!
//! - **Validity** (`validity.rs`): pure window checks. Passports are valid
//!   for ten years from issuance; Visas for a caller-chosen window unless
//!   cancelled. Bounds are inclusive.
//!
//! - **Registry** (`registry.rs`): live records, the id allocator, and the
//!   one-live-Passport-per-holder index. Snapshots for persistence.
//!
//! - **Access** (`access.rs`): the authority issues and cancels; holders
//!   burn.
//!
//! - **Transfer** (`transfer.rs`): mint and burn are the only holder
//!   changes. Every other transfer is refused, with no override.
//!
//! - **Lifecycle** (`lifecycle.rs`): the thread-safe façade callers use.
//!
//! - **Events** (`events.rs`): one audit event per committed mutation,
//!   delivered to an injectable sink.

pub mod access;
pub mod credential;
pub mod events;
pub mod lifecycle;
pub mod registry;
pub mod transfer;
pub mod validity;

// ─── Credential re-exports ──────────────────────────────────────────

pub use credential::{Credential, CredentialTerms, IssueTerms, PassportTerms, VisaTerms};

// ─── Validity re-exports ────────────────────────────────────────────

pub use validity::{ValidityStatus, ValidityWindow};

// ─── Registry re-exports ────────────────────────────────────────────

pub use registry::{CredentialRegistry, RegistrySnapshot, SnapshotError};

// ─── Guard re-exports ───────────────────────────────────────────────

pub use access::{AccessControl, AuthorityConfig};
pub use transfer::{HolderChange, TransferGuard};

// ─── Service re-exports ─────────────────────────────────────────────

pub use events::{ChannelSink, EventKind, EventSink, LifecycleEvent, MemorySink, TracingSink};
pub use lifecycle::LifecycleService;
