//! # Passport Subcommand
//!
//! - `issue`: the authority mints a Passport for a holder.
//! - `burn`: the holder destroys their Passport.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use cryptonia_core::{CredentialId, Identity};

use crate::parse;
use crate::session::Session;

/// Arguments for the `cryptonia passport` subcommand.
#[derive(Args, Debug)]
pub struct PassportArgs {
    #[command(subcommand)]
    pub command: PassportCommand,
}

/// Passport subcommands.
#[derive(Subcommand, Debug)]
pub enum PassportCommand {
    /// Issue a ten-year Passport. One live Passport per holder.
    Issue {
        /// Identity performing the call; must be the authority.
        #[arg(long)]
        caller: Identity,
        /// Recipient of the Passport.
        #[arg(long)]
        holder: Identity,
        /// Opaque metadata reference (e.g. an ipfs:// URI).
        #[arg(long, default_value = "")]
        metadata: String,
    },

    /// Burn a Passport. Only its holder may do this.
    Burn {
        /// Identity performing the call; must be the holder.
        #[arg(long)]
        caller: Identity,
        /// Passport id.
        #[arg(long, value_parser = parse::credential_id)]
        id: CredentialId,
    },
}

/// Execute the passport subcommand.
pub fn run_passport(args: &PassportArgs, session: &Session) -> Result<u8> {
    match &args.command {
        PassportCommand::Issue {
            caller,
            holder,
            metadata,
        } => cmd_issue(session, caller, holder, metadata),
        PassportCommand::Burn { caller, id } => cmd_burn(session, caller, *id),
    }
}

fn cmd_issue(session: &Session, caller: &Identity, holder: &Identity, metadata: &str) -> Result<u8> {
    let service = session.service();
    let id = service
        .issue_passport(caller, holder.clone(), metadata)
        .with_context(|| format!("cannot issue passport to {holder}"))?;
    session.commit()?;

    let expires = service.expires_at(id)?;
    println!("OK: issued passport {id} to {holder} (valid until {expires})");
    Ok(0)
}

fn cmd_burn(session: &Session, caller: &Identity, id: CredentialId) -> Result<u8> {
    session
        .service()
        .burn_passport(caller, id)
        .with_context(|| format!("cannot burn passport {id}"))?;
    session.commit()?;

    println!("OK: burned passport {id}");
    Ok(0)
}
