//! MyWhoosh web API response shapes
//!
//! Every field the API may omit is optional by design; consumers tolerate
//! absent fields instead of trusting the upstream JSON shape.

use serde::Deserialize;

/// Envelope for `POST /rider/profile/activities`.
#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<ActivitiesData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesData {
    pub results: Option<Vec<ActivitySummary>>,
}

/// One recorded ride.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivitySummary {
    pub id: Option<String>,
    /// Unix seconds
    pub date: i64,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub title: Option<String>,
    pub sport_type: Option<String>,
    pub route_name: Option<String>,
    pub distance: f64,
    pub elevation: i64,
    pub watt: i64,
    pub watt_per_kg: f64,
    pub heartrate: i64,
    pub ride_duration: Option<String>,
    pub start_datetime: Option<String>,
    pub created_at: Option<String>,
    pub activity_file_id: Option<String>,
}

impl ActivitySummary {
    /// Identifier used to fetch the FIT file; falls back to the activity id.
    pub fn file_id(&self) -> Option<&str> {
        self.activity_file_id.as_deref().or(self.id.as_deref())
    }

    /// Best available human label for log lines.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.route_name.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("(untitled)")
    }
}

/// Envelope for `POST /rider/profile/download-activity-file`; `data` is a
/// presigned URL for the FIT bytes.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<String>,
}
