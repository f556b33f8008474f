//! Lease coordination
//!
//! Callers speak in relative expiry ("seconds from now"); the ledger stores
//! absolute instants. These helpers convert between the two against a
//! caller-supplied clock and translate ledger failures into client errors.

use crate::ledger::{LeaseEntry, LedgerError};
use chrono::{DateTime, TimeDelta, Utc};
use dockyard_common::{Error, Lease, Result};

/// Reject expiry values that cannot describe a point in the future
///
/// JSON has no encoding for NaN or infinity, so these would otherwise turn
/// into "never expires" on the wire.
pub fn validate_expiry(expires: Option<f64>) -> Result<()> {
    match expires {
        Some(secs) if !secs.is_finite() => Err(Error::invalid_argument(format!(
            "lease expiry must be a finite number of seconds, got {secs}"
        ))),
        Some(secs) if secs < 0.0 => Err(Error::invalid_argument(format!(
            "lease expiry cannot be negative, got {secs}"
        ))),
        _ => Ok(()),
    }
}

/// Absolute expiry of a lease granted at `now` for `expires` seconds
#[allow(clippy::cast_possible_truncation)]
pub fn absolute_expiry(now: DateTime<Utc>, expires: Option<f64>) -> Result<Option<DateTime<Utc>>> {
    validate_expiry(expires)?;
    let Some(secs) = expires else {
        return Ok(None);
    };
    let out_of_range = || Error::invalid_argument(format!("lease expiry out of range: {secs}"));
    let millis = (secs * 1000.0).round();
    if millis >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    let delta = TimeDelta::try_milliseconds(millis as i64).ok_or_else(out_of_range)?;
    now.checked_add_signed(delta)
        .map(Some)
        .ok_or_else(out_of_range)
}

/// Seconds from `now` until `expiration`, `None` for leases that never expire
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn relative_expiry(now: DateTime<Utc>, expiration: Option<DateTime<Utc>>) -> Option<f64> {
    expiration.map(|expiration| (expiration - now).num_milliseconds() as f64 / 1000.0)
}

/// Present a ledger entry to callers, relative to `now`
#[must_use]
pub fn lease_from_entry(now: DateTime<Utc>, entry: &LeaseEntry) -> Lease {
    Lease {
        dataset_id: entry.dataset_id,
        node_uuid: entry.node_id,
        expires: relative_expiry(now, entry.expiration),
    }
}

impl From<LedgerError> for Error {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Conflict { .. } | LedgerError::WrongNode { .. } => {
                Self::LeaseAlreadyHeld(e.to_string())
            }
            LedgerError::NotFound(_) => Self::LeaseNotFound(e.to_string()),
        }
    }
}
