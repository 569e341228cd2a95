//! Sync flow: MyWhoosh activities to Intervals.icu
//!
//! Lists activities, optionally filters by start date, then downloads and
//! re-uploads each FIT file. Per-activity failures are counted and reported;
//! there are no retries.

use anyhow::Result;
use chrono::NaiveDate;

use crate::api::{IntervalsClient, MyWhooshClient};
use crate::auth::{TokenPersistence, TokenStore};
use crate::config::Config;

pub async fn run<P: TokenPersistence>(
    store: &TokenStore<P>,
    config: &Config,
    since: Option<NaiveDate>,
    dry_run: bool,
) -> Result<()> {
    let mywhoosh = MyWhooshClient::new(store)?;

    println!("Starting sync...");
    println!("Fetching activities from MyWhoosh...");
    let mut activities = mywhoosh.list_activities(1).await?;

    if let Some(since) = since {
        let cutoff = since.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        activities.retain(|a| a.date >= cutoff);
    }

    if activities.is_empty() {
        println!("No activities to sync.");
        return Ok(());
    }
    println!("Found {} activities to sync.", activities.len());

    if dry_run {
        println!("[DRY RUN] Would sync:");
        for activity in &activities {
            println!(
                "  - {} ({})",
                activity.label(),
                activity.file_id().unwrap_or("no file id")
            );
        }
        return Ok(());
    }

    let intervals = IntervalsClient::new(config)?;

    let mut synced = 0;
    let mut failed = 0;
    for activity in &activities {
        println!();
        println!("Processing: {}", activity.label());

        let Some(file_id) = activity.file_id() else {
            println!("  skipped: no activity file id");
            failed += 1;
            continue;
        };

        let fit = match mywhoosh.download_fit(file_id).await {
            Ok(fit) => fit,
            Err(e) => {
                println!("  download failed: {:#}", e);
                failed += 1;
                continue;
            }
        };

        match intervals.upload_fit(fit, &format!("{}.fit", file_id)).await {
            Ok(_) => {
                println!("  synced to Intervals.icu");
                synced += 1;
            }
            Err(e) => {
                println!("  upload failed: {:#}", e);
                failed += 1;
            }
        }
    }

    println!();
    println!("Sync complete: {} succeeded, {} failed", synced, failed);
    Ok(())
}
