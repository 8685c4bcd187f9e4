//! # Visa Subcommand
//!
//! - `issue`: the authority grants a time-boxed Visa.
//! - `cancel`: the authority revokes a Visa. The record stays.
//!
//! Offsets and durations accept a unit suffix: `90`, `15m`, `12h`, `30d`, `2w`.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use cryptonia_core::{CredentialId, Identity};

use crate::parse;
use crate::session::Session;

/// Arguments for the `cryptonia visa` subcommand.
#[derive(Args, Debug)]
pub struct VisaArgs {
    #[command(subcommand)]
    pub command: VisaCommand,
}

/// Visa subcommands.
#[derive(Subcommand, Debug)]
pub enum VisaCommand {
    /// Issue a Visa valid for [now + start-offset, now + start-offset + duration].
    Issue {
        /// Identity performing the call; must be the authority.
        #[arg(long)]
        caller: Identity,
        /// Recipient of the Visa.
        #[arg(long)]
        holder: Identity,
        /// Delay before the Visa becomes valid.
        #[arg(long, default_value = "0", allow_hyphen_values = true, value_parser = parse::seconds)]
        start_offset: i64,
        /// Length of the validity window. Must be positive.
        #[arg(long, allow_hyphen_values = true, value_parser = parse::seconds)]
        duration: i64,
        /// Opaque metadata reference.
        #[arg(long, default_value = "")]
        metadata: String,
    },

    /// Cancel a Visa. Cancelling twice is a no-op.
    Cancel {
        /// Identity performing the call; must be the authority.
        #[arg(long)]
        caller: Identity,
        /// Visa id.
        #[arg(long, value_parser = parse::credential_id)]
        id: CredentialId,
    },
}

/// Execute the visa subcommand.
pub fn run_visa(args: &VisaArgs, session: &Session) -> Result<u8> {
    match &args.command {
        VisaCommand::Issue {
            caller,
            holder,
            start_offset,
            duration,
            metadata,
        } => cmd_issue(session, caller, holder, *start_offset, *duration, metadata),
        VisaCommand::Cancel { caller, id } => cmd_cancel(session, caller, *id),
    }
}

fn cmd_issue(
    session: &Session,
    caller: &Identity,
    holder: &Identity,
    start_offset: i64,
    duration: i64,
    metadata: &str,
) -> Result<u8> {
    let service = session.service();
    let id = service
        .issue_visa(caller, holder.clone(), start_offset, duration, metadata)
        .with_context(|| format!("cannot issue visa to {holder}"))?;
    session.commit()?;

    let credential = service.credential(id)?;
    let terms = credential.as_visa()?;
    println!(
        "OK: issued visa {id} to {holder} (valid {} .. {})",
        terms.valid_from, terms.valid_until
    );
    Ok(0)
}

fn cmd_cancel(session: &Session, caller: &Identity, id: CredentialId) -> Result<u8> {
    session
        .service()
        .cancel_visa(caller, id)
        .with_context(|| format!("cannot cancel visa {id}"))?;
    session.commit()?;

    println!("OK: visa {id} cancelled");
    Ok(0)
}
