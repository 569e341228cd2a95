//! Data models for upstream API responses

mod activity;
mod handoff;

pub use activity::{ActivitiesData, ActivitiesResponse, ActivitySummary, DownloadResponse};
pub use handoff::IncomingToken;
