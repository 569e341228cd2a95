//! Local FIT file watcher
//!
//! Watches directories for new `.fit` files and uploads each one to
//! Intervals.icu as it appears. Files are opaque bytes here; nothing parses
//! them. Detection is a periodic rescan with a seen-set, so a file is
//! handled at most once per run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::IntervalsClient;
use crate::config::Config;

const POLL_INTERVAL: Duration = Duration::from_secs(5);

fn is_fit_file(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("fit"))
}

/// Tracks handled files across rescans.
#[derive(Default)]
struct Scanner {
    seen: HashSet<PathBuf>,
}

impl Scanner {
    /// Scan the directories and return unseen `.fit` files, marking them
    /// seen. Unreadable directories are logged and skipped so one bad path
    /// does not stop the watch.
    fn scan(&mut self, dirs: &[PathBuf]) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for dir in dirs {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), "failed to scan directory: {}", e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() || !is_fit_file(&path) {
                    continue;
                }
                if self.seen.insert(path.clone()) {
                    found.push(path);
                }
            }
        }
        found.sort();
        found
    }
}

/// Watch directories and auto-upload new FIT files.
///
/// With `once`, every `.fit` file currently present is uploaded and the
/// command exits. Without it, files already present are treated as handled
/// (there is no cross-run upload ledger, so re-uploading them on every
/// restart would duplicate activities) and only files appearing afterwards
/// are uploaded.
pub async fn run(config: &Config, dirs: Vec<PathBuf>, once: bool) -> Result<()> {
    let intervals = IntervalsClient::new(config)?;
    let mut scanner = Scanner::default();

    if once {
        let existing = scanner.scan(&dirs);
        if existing.is_empty() {
            println!("No FIT files found.");
            return Ok(());
        }
        println!("Found {} FIT files.", existing.len());
        let (uploaded, failed) = upload_batch(&intervals, &existing).await;
        println!("Done: {} uploaded, {} failed.", uploaded, failed);
        return Ok(());
    }

    let existing = scanner.scan(&dirs);
    if !existing.is_empty() {
        info!(
            count = existing.len(),
            "existing FIT files will not be re-uploaded (use --once to sync them)"
        );
    }

    for dir in &dirs {
        println!("Watching {} for new FIT files...", dir.display());
    }
    println!("Press Ctrl-C to stop.");

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        ticker.tick().await;
        let new_files = scanner.scan(&dirs);
        if new_files.is_empty() {
            debug!("no new FIT files");
            continue;
        }
        upload_batch(&intervals, &new_files).await;
    }
}

/// Upload each file, continuing past per-file failures.
async fn upload_batch(intervals: &IntervalsClient, files: &[PathBuf]) -> (usize, usize) {
    let mut uploaded = 0;
    let mut failed = 0;
    for path in files {
        println!("Uploading {}...", path.display());
        match upload_one(intervals, path).await {
            Ok(()) => {
                println!("  uploaded");
                uploaded += 1;
            }
            Err(e) => {
                println!("  failed: {:#}", e);
                failed += 1;
            }
        }
    }
    (uploaded, failed)
}

async fn upload_one(intervals: &IntervalsClient, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "activity.fit".to_string());
    intervals.upload_fit(bytes, &filename).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_watch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "fitbridge-watch-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_is_fit_file() {
        assert!(is_fit_file(Path::new("ride.fit")));
        assert!(is_fit_file(Path::new("RIDE.FIT")));
        assert!(!is_fit_file(Path::new("ride.gpx")));
        assert!(!is_fit_file(Path::new("fit")));
    }

    #[test]
    fn test_scan_finds_only_fit_files() {
        let dir = temp_watch_dir("find");
        fs::write(dir.join("a.fit"), b"fit").unwrap();
        fs::write(dir.join("b.FIT"), b"fit").unwrap();
        fs::write(dir.join("notes.txt"), b"text").unwrap();
        fs::create_dir(dir.join("nested.fit")).unwrap();

        let mut scanner = Scanner::default();
        let found = scanner.scan(&[dir.clone()]);
        assert_eq!(found, vec![dir.join("a.fit"), dir.join("b.FIT")]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rescan_yields_only_new_files() {
        let dir = temp_watch_dir("rescan");
        fs::write(dir.join("first.fit"), b"fit").unwrap();

        let mut scanner = Scanner::default();
        assert_eq!(scanner.scan(&[dir.clone()]).len(), 1);
        assert!(scanner.scan(&[dir.clone()]).is_empty());

        fs::write(dir.join("second.fit"), b"fit").unwrap();
        assert_eq!(scanner.scan(&[dir.clone()]), vec![dir.join("second.fit")]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unreadable_directory_is_skipped() {
        let dir = temp_watch_dir("missing");
        fs::write(dir.join("a.fit"), b"fit").unwrap();
        let missing = dir.join("does-not-exist");

        let mut scanner = Scanner::default();
        let found = scanner.scan(&[missing, dir.clone()]);
        assert_eq!(found, vec![dir.join("a.fit")]);

        let _ = fs::remove_dir_all(&dir);
    }
}
