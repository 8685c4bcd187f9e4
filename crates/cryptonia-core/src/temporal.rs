//! # Temporal Types: UTC Epoch-Second Timestamps
//!
//! Defines `Timestamp`, a UTC instant with one-second granularity stored as
//! seconds since the Unix epoch. All validity windows in the credential
//! lifecycle are computed in whole seconds, so sub-second precision is
//! never represented.
//!
//! ## Arithmetic
//!
//! Window arithmetic goes through [`Timestamp::checked_add_secs`]. Overflow
//! is reported to the caller rather than wrapping or saturating, which
//! would silently produce a window the issuer never asked for.
//!
//! ## Rendering
//!
//! `Display` renders `YYYY-MM-DDTHH:MM:SSZ` whenever the instant lies within
//! chrono's representable range and falls back to the raw epoch value
//! otherwise.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds in one day.
pub const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// Fixed Passport lifetime: ten 365-day years.
pub const PASSPORT_VALIDITY_SECS: i64 = 10 * 365 * SECONDS_PER_DAY;

/// Errors parsing a timestamp from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Neither an epoch integer nor an RFC 3339 string.
    #[error("invalid timestamp {input:?}: expected epoch seconds or RFC 3339 (e.g. 2026-01-15T12:00:00Z)")]
    Unparseable {
        /// The rejected input.
        input: String,
    },
}

/// A UTC instant, seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Create a timestamp from Unix epoch seconds.
    pub const fn from_epoch_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    /// Parse either a bare epoch-second integer or an RFC 3339 string.
    ///
    /// RFC 3339 inputs with a non-UTC offset are converted to UTC.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        let trimmed = s.trim();
        if let Ok(secs) = trimmed.parse::<i64>() {
            return Ok(Self(secs));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self(dt.with_timezone(&Utc).timestamp()))
            .map_err(|_| TimestampError::Unparseable {
                input: s.to_string(),
            })
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub const fn epoch_secs(&self) -> i64 {
        self.0
    }

    /// `self + secs`, or `None` on overflow.
    pub fn checked_add_secs(&self, secs: i64) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }

    /// The instant as a chrono `DateTime`, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            None => format!("@{}", self.0),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}
