//! # Query Subcommands
//!
//! Read-only views over the registry. None of these touch the state files.
//!
//! `status` doubles as a scripting check: it exits 0 when the credential
//! is valid and [`EXIT_NOT_VALID`] otherwise, including for unknown ids.

use anyhow::{Context, Result};
use clap::Args;

use cryptonia_core::{CredentialId, Identity, Timestamp};
use cryptonia_state::{validity, Credential, CredentialTerms, ValidityStatus};

use crate::parse;
use crate::session::Session;

/// Exit code of `status` for a credential that is not valid.
pub const EXIT_NOT_VALID: u8 = 2;

/// Arguments for `cryptonia status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Credential id.
    #[arg(long, value_parser = parse::credential_id)]
    pub id: CredentialId,
    /// Instant to evaluate at (epoch seconds or RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse::timestamp)]
    pub at: Option<Timestamp>,
}

/// Arguments for `cryptonia owner`.
#[derive(Args, Debug)]
pub struct OwnerArgs {
    /// Credential id.
    #[arg(long, value_parser = parse::credential_id)]
    pub id: CredentialId,
}

/// Arguments for `cryptonia balance`.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Holder identity.
    #[arg(long)]
    pub holder: Identity,
}

/// Report validity of one credential.
pub fn run_status(args: &StatusArgs, session: &Session) -> Result<u8> {
    let service = session.service();
    let at = args.at.unwrap_or_else(|| service.now());

    let Ok(credential) = service.credential(args.id) else {
        println!("Credential {}: UNKNOWN", args.id);
        return Ok(EXIT_NOT_VALID);
    };
    let status = validity::status(&credential, at);

    println!("Credential {}: {status}", args.id);
    print_details(&credential);
    println!("  Evaluated at: {at}");

    Ok(if status.is_valid() { 0 } else { EXIT_NOT_VALID })
}

/// Print the holder of a live credential.
pub fn run_owner(args: &OwnerArgs, session: &Session) -> Result<u8> {
    let owner = session
        .service()
        .owner_of(args.id)
        .with_context(|| format!("no owner for credential {}", args.id))?;
    println!("{owner}");
    Ok(0)
}

/// Print the number of live credentials held by an identity.
pub fn run_balance(args: &BalanceArgs, session: &Session) -> Result<u8> {
    println!("{}", session.service().balance_of(&args.holder));
    Ok(0)
}

/// List every live credential with its status at the session clock.
pub fn run_list(session: &Session) -> Result<u8> {
    let now = session.service().now();
    let rows = list_rows(session, now);

    if rows.is_empty() {
        println!("No credentials found.");
        return Ok(0);
    }
    println!("Credentials ({}):", rows.len());
    for (id, kind, holder, status) in &rows {
        println!("  {id}: {kind} {holder} {status}");
    }
    Ok(0)
}

type ListRow = (CredentialId, &'static str, Identity, ValidityStatus);

fn list_rows(session: &Session, now: Timestamp) -> Vec<ListRow> {
    session.service().read(|registry| {
        registry
            .iter()
            .map(|c| {
                (
                    c.id(),
                    c.kind().as_str(),
                    c.holder().clone(),
                    validity::status(c, now),
                )
            })
            .collect()
    })
}

fn print_details(credential: &Credential) {
    println!("  Variant: {}", credential.kind());
    println!("  Holder: {}", credential.holder());
    if !credential.metadata_ref().is_empty() {
        println!("  Metadata: {}", credential.metadata_ref());
    }
    println!("  Issued: {}", credential.issued_at());
    match credential.terms() {
        CredentialTerms::Passport(p) => println!("  Expires: {}", p.expires_at),
        CredentialTerms::Visa(v) => {
            println!("  Valid from: {}", v.valid_from);
            println!("  Valid until: {}", v.valid_until);
            if let Some(at) = v.cancelled_at {
                println!("  Cancelled: {at}");
            } else if v.cancelled {
                println!("  Cancelled: yes");
            }
        }
    }
}
