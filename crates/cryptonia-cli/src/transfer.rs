//! # Transfer Subcommand
//!
//! Credentials are soulbound. The command exists so that attempts are
//! rejected and logged the same way the service rejects them; it never
//! changes state.

use anyhow::{Context, Result};
use clap::Args;

use cryptonia_core::{CredentialId, Identity};

use crate::parse;
use crate::session::Session;

/// Arguments for the `cryptonia transfer` subcommand.
#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Identity performing the call.
    #[arg(long)]
    pub caller: Identity,
    /// Current holder.
    #[arg(long)]
    pub from: Identity,
    /// Intended recipient.
    #[arg(long)]
    pub to: Identity,
    /// Credential id.
    #[arg(long, value_parser = parse::credential_id)]
    pub id: CredentialId,
}

/// Execute the transfer subcommand. Always fails with `NonTransferable`
/// and leaves the state files untouched.
pub fn run_transfer(args: &TransferArgs, session: &Session) -> Result<u8> {
    session
        .service()
        .transfer(&args.caller, &args.from, &args.to, args.id)
        .with_context(|| format!("cannot transfer credential {} to {}", args.id, args.to))?;
    Ok(0)
}
