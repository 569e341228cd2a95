//! API clients for the fitness platforms

pub mod intervals;
pub mod mywhoosh;

use std::path::Path;

use anyhow::{bail, Context, Result};

pub use intervals::IntervalsClient;
pub use mywhoosh::MyWhooshClient;

use crate::auth::{TokenPersistence, TokenStore};
use crate::config::Config;

/// List recent MyWhoosh activities.
pub async fn list_activities<P: TokenPersistence>(
    store: &TokenStore<P>,
    page: u32,
) -> Result<()> {
    let client = MyWhooshClient::new(store)?;
    println!("Fetching activities from MyWhoosh...");
    let activities = client.list_activities(page).await?;

    if activities.is_empty() {
        println!("No activities found.");
        return Ok(());
    }

    println!("Found {} activities:", activities.len());
    println!("{}", "-".repeat(80));
    for activity in &activities {
        let date = chrono::DateTime::from_timestamp(activity.date, 0)
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "????-??-?? --:--".to_string());
        println!(
            "  {} | {} | {} | {:.1}km | {}W | {}",
            activity.file_id().unwrap_or("-"),
            date,
            activity.label(),
            activity.distance,
            activity.watt,
            activity.ride_duration.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Download one activity's FIT file into `output_dir`.
pub async fn download_activity<P: TokenPersistence>(
    store: &TokenStore<P>,
    activity_file_id: &str,
    output_dir: &Path,
) -> Result<()> {
    let client = MyWhooshClient::new(store)?;
    println!("Downloading activity {}...", activity_file_id);
    let fit = client.download_fit(activity_file_id).await?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(format!("{}.fit", activity_file_id));
    std::fs::write(&path, &fit).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Downloaded: {}", path.display());
    Ok(())
}

/// Upload one FIT file to Intervals.icu.
pub async fn upload_file(config: &Config, path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    let fit = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("activity.fit");

    let client = IntervalsClient::new(config)?;
    println!("Uploading {} to Intervals.icu...", filename);
    client.upload_fit(fit, filename).await?;
    println!("Upload complete!");
    Ok(())
}

/// Verify the configured Intervals.icu credentials.
pub async fn test_connection(config: &Config) -> Result<()> {
    let client = IntervalsClient::new(config)?;
    client.test_connection().await?;
    println!("Intervals.icu connection OK");
    Ok(())
}

/// Check HTTP response status code and return a clear error on failure.
pub(crate) async fn check_response(
    resp: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        bail!(
            "401 Unauthorized for {}. Token may be stale -- run 'fitbridge login'.",
            url
        );
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("HTTP {} for {}: {}", status.as_u16(), url, body);
    }
    Ok(resp)
}
