//! # cryptonia-cli: Credential Registry Command-Line Interface
//!
//! Drives the `cryptonia-state` lifecycle service against a registry kept
//! on local disk.
//!
//! ## Subcommands
//!
//! - `passport`: issue and burn Passports
//! - `visa`: issue and cancel Visas
//! - `transfer`: always refused; credentials are soulbound
//! - `status`, `owner`, `balance`, `list`: read-only queries
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handlers delegate to `cryptonia-state`; no lifecycle rules live here.
//! - Handlers return the process exit code; errors exit 1.

pub mod config;
pub mod parse;
pub mod passport;
pub mod query;
pub mod session;
pub mod store;
pub mod transfer;
pub mod visa;
