//! Intervals.icu API client
//!
//! Auth scheme per the Intervals.icu API cookbook: HTTP Basic with the
//! literal username `API_KEY` and the athlete's key as password.

use anyhow::{bail, Context, Result};

use super::check_response;
use crate::config::Config;

const BASE_URL: &str = "https://intervals.icu/api/v1";

/// Authenticated Intervals.icu client.
pub struct IntervalsClient {
    http: reqwest::Client,
    api_key: String,
    athlete_id: String,
}

impl IntervalsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let (Some(api_key), Some(athlete_id)) = (
            config.intervals.api_key.clone(),
            config.intervals.athlete_id.clone(),
        ) else {
            bail!(
                "Intervals.icu not configured.\n\
                 Run: fitbridge config set intervals.apikey <your-api-key>\n\
                 Run: fitbridge config set intervals.athleteid <your-athlete-id>\n\
                 \n\
                 Get your API key from https://intervals.icu/settings; your athlete\n\
                 ID is shown on your profile (e.g. i12345)."
            );
        };

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            athlete_id,
        })
    }

    /// Upload one FIT file as a new activity.
    pub async fn upload_fit(&self, fit: Vec<u8>, filename: &str) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(fit)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .context("Failed to build multipart body")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/athlete/{}/activities", BASE_URL, self.athlete_id);
        tracing::debug!("Intervals POST {} ({})", url, filename);

        let resp = self
            .http
            .post(&url)
            .basic_auth("API_KEY", Some(&self.api_key))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Intervals POST {} failed", url))?;
        let resp = check_response(resp, &url).await?;

        resp.text().await.context("Failed to read upload response")
    }

    /// Verify the configured credentials by fetching the athlete profile.
    pub async fn test_connection(&self) -> Result<()> {
        let url = format!("{}/athlete/{}", BASE_URL, self.athlete_id);
        tracing::debug!("Intervals GET {}", url);

        let resp = self
            .http
            .get(&url)
            .basic_auth("API_KEY", Some(&self.api_key))
            .send()
            .await
            .with_context(|| format!("Intervals GET {} failed", url))?;
        check_response(resp, &url).await?;
        Ok(())
    }
}
