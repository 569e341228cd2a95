//! Bearer token claim decoding
//!
//! Captured tokens are opaque strings. When a token happens to be a signed
//! claims token (three dot-separated base64url segments), the middle segment
//! carries a JSON claims object we can read an expiry from. Anything else is
//! expected and simply yields no claims -- decode failures never escape this
//! module.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

/// Decode the claims payload of a three-segment token.
///
/// Returns `None` for any shape that is not a claims token: wrong segment
/// count, invalid base64url, or a payload that is not a JSON object.
pub fn decode_claims(raw_token: &str) -> Option<serde_json::Value> {
    let mut segments = raw_token.split('.');
    let payload = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };

    // Some producers pad the payload; the alphabet is base64url either way.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.is_object().then_some(value)
}

/// Extract the `exp` claim (Unix seconds) as a UTC timestamp.
pub fn expiry_claim(raw_token: &str) -> Option<DateTime<Utc>> {
    let claims = decode_claims(raw_token)?;
    let exp = claims.get("exp")?;
    let secs = exp
        .as_i64()
        .or_else(|| exp.as_f64().map(|secs| secs as i64))?;
    DateTime::from_timestamp(secs, 0)
}
