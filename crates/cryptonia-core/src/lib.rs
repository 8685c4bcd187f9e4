//! # cryptonia-core: Foundational Types for Cryptonia Credentials
//!
//! This crate defines the primitives every other crate in the workspace
//! builds on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `Identity` and
//!    `CredentialId` are newtypes with validated constructors. No bare
//!    strings or integers cross crate boundaries as principals or ids.
//!
//! 2. **Single `CredentialKind` discriminator.** Passport and Visa are the
//!    only variants; every consumer matches exhaustively.
//!
//! 3. **UTC epoch-second timestamps.** `Timestamp` has one-second
//!    granularity, matching the validity arithmetic of the credential
//!    lifecycle. Windows are computed with checked arithmetic only.
//!
//! 4. **Time is injected.** Lifecycle code reads time through the `Clock`
//!    trait, never from the system directly.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cryptonia-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod clock;
pub mod error;
pub mod identity;
pub mod temporal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CredentialError, IdentityError, Role};
pub use identity::{CredentialId, CredentialKind, Identity};
pub use temporal::{Timestamp, TimestampError, PASSPORT_VALIDITY_SECS, SECONDS_PER_DAY};
