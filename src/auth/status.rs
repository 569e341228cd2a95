//! Token status classification
//!
//! Derives a connectivity status and a human-readable remaining-time message
//! from a credential's expiry. The status is the contract; the message is
//! presentation.

use chrono::{DateTime, Duration, Utc};

const EXPIRING_WINDOW: i64 = 2 * 3600;
const HOURS_WINDOW: i64 = 24 * 3600;

/// Derived connectivity state of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No credential stored for the platform.
    NotConnected,
    /// Credential present with comfortable remaining lifetime.
    Connected,
    /// Less than two hours of lifetime left.
    Expiring,
    /// Expiry is now or in the past.
    Expired,
    /// Credential carries no decodable expiry claim; treated as connected.
    Unknown,
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenStatus::NotConnected => "not-connected",
            TokenStatus::Connected => "connected",
            TokenStatus::Expiring => "expiring",
            TokenStatus::Expired => "expired",
            TokenStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Classify an optional expiry against `now`.
///
/// Boundary convention: the exact expiry instant counts as expired, and the
/// bucket edges at 2 h and 24 h belong to the longer-lived bucket (exactly
/// two hours remaining is `Connected`, not `Expiring`).
pub fn classify(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (TokenStatus, String) {
    let Some(expires_at) = expires_at else {
        return (TokenStatus::Unknown, "Connected".to_string());
    };

    let remaining = expires_at - now;
    if remaining <= Duration::zero() {
        return (TokenStatus::Expired, "Please log in again".to_string());
    }

    let secs = remaining.num_seconds();
    if secs < EXPIRING_WINDOW {
        (TokenStatus::Expiring, "Log in again soon".to_string())
    } else if secs < HOURS_WINDOW {
        let hours = (secs as f64 / 3600.0).round() as i64;
        (TokenStatus::Connected, format!("Good for {} hours", hours))
    } else {
        let days = (secs as f64 / 3600.0 / 24.0).round() as i64;
        (TokenStatus::Connected, format!("Good for {} days", days))
    }
}
