//! Payload pushed by the browser extension

use serde::Deserialize;

/// One pushed token entry. The extension sends `capturedAt` and a display
/// name too, but the store stamps its own capture time and re-derives
/// expiry, so those are informational only.
#[derive(Debug, Deserialize)]
pub struct IncomingToken {
    pub token: Option<String>,
    #[serde(rename = "capturedAt")]
    pub captured_at: Option<String>,
    pub platform: Option<String>,
}
