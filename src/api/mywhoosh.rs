//! MyWhoosh web API client (service14.mywhoosh.com)
//!
//! Uses the web login flow's bearer token; the game API blocks non-game
//! clients, so requests carry browser-like headers.

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, USER_AGENT};

use super::check_response;
use crate::auth::{TokenPersistence, TokenStatus, TokenStore};
use crate::models::{ActivitiesResponse, ActivitySummary, DownloadResponse};

const SERVICE_BASE: &str = "https://service14.mywhoosh.com/v2";
const WEB_ORIGIN: &str = "https://event.mywhoosh.com";
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Authenticated MyWhoosh web client.
pub struct MyWhooshClient {
    http: reqwest::Client,
    token: String,
}

impl MyWhooshClient {
    /// Build a client from the stored token. Refuses to build when the token
    /// is missing or expired rather than issuing doomed requests.
    pub fn new<P: TokenPersistence>(store: &TokenStore<P>) -> Result<Self> {
        let Some(credential) = store.get("mywhoosh") else {
            bail!("No MyWhoosh token. Run 'fitbridge login mywhoosh' first.");
        };
        let (status, _) = store.status_of("mywhoosh");
        if status == TokenStatus::Expired {
            bail!("MyWhoosh token expired. Run 'fitbridge login mywhoosh'.");
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_static(WEB_ORIGIN));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            token: credential.token.clone(),
        })
    }

    /// List the rider's recorded activities, newest first.
    pub async fn list_activities(&self, page: u32) -> Result<Vec<ActivitySummary>> {
        let url = format!("{}/rider/profile/activities", SERVICE_BASE);
        tracing::debug!("MyWhoosh POST {} (page {})", url, page);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "sortDate": "DESC", "page": page }))
            .send()
            .await
            .with_context(|| format!("MyWhoosh POST {} failed", url))?;
        let resp = check_response(resp, &url).await?;

        let body: ActivitiesResponse = resp
            .json()
            .await
            .context("Failed to parse activities response")?;
        if body.error {
            bail!(
                "MyWhoosh API error (code {}): {}",
                body.code,
                body.message.as_deref().unwrap_or("no message")
            );
        }

        Ok(body.data.and_then(|d| d.results).unwrap_or_default())
    }

    /// Download one activity's FIT file as opaque bytes: resolve the
    /// presigned URL, then fetch it.
    pub async fn download_fit(&self, activity_file_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/rider/profile/download-activity-file", SERVICE_BASE);
        tracing::debug!("MyWhoosh POST {} (file {})", url, activity_file_id);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "fileId": activity_file_id }))
            .send()
            .await
            .with_context(|| format!("MyWhoosh POST {} failed", url))?;
        let resp = check_response(resp, &url).await?;

        let body: DownloadResponse = resp
            .json()
            .await
            .context("Failed to parse download response")?;
        let Some(presigned_url) = body.data.filter(|u| !u.is_empty()) else {
            bail!(
                "No download URL in response for activity file {}",
                activity_file_id
            );
        };

        tracing::debug!("Downloading FIT from presigned URL");
        let fit_resp = self
            .http
            .get(&presigned_url)
            .send()
            .await
            .context("FIT download failed")?;
        let fit_resp = check_response(fit_resp, &presigned_url).await?;

        let bytes = fit_resp.bytes().await.context("Failed to read FIT bytes")?;
        Ok(bytes.to_vec())
    }
}
