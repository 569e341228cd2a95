//! Interactive login, logout and status commands
//!
//! The platforms block non-browser logins, so `login` walks the user through
//! copying a token out of the browser's developer tools and resolves the
//! capture adapter's paste prompt with the pasted value.

use std::io::Write;

use anyhow::{bail, Context, Result};

use super::capture::paste_prompt;
use super::store::{TokenPersistence, TokenStore};
use super::{platform, TokenStatus, PLATFORMS};
use crate::config::Config;

/// Interactive paste-token login for one platform.
pub fn login<P: TokenPersistence>(
    store: &mut TokenStore<P>,
    config: &mut Config,
    platform_id: &str,
    force: bool,
) -> Result<()> {
    let Some(spec) = platform(platform_id) else {
        bail!(
            "Unknown platform '{}'. Known platforms: {}",
            platform_id,
            PLATFORMS
                .iter()
                .map(|p| p.id)
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    if force {
        if store.clear(Some(spec.id))? {
            println!("Cleared cached credentials.");
        }
    } else {
        let (status, message) = store.status_of(spec.id);
        match status {
            TokenStatus::Connected | TokenStatus::Expiring | TokenStatus::Unknown => {
                println!(
                    "Already logged in to {} ({}). Use --force to re-authenticate.",
                    spec.name, message
                );
                return Ok(());
            }
            TokenStatus::Expired => {
                println!("Stored {} token has expired.", spec.name);
            }
            TokenStatus::NotConnected => {}
        }
    }

    let prompt = paste_prompt(spec);
    println!();
    println!("=== {} Authentication ===", spec.name);
    println!("Log in at: {}", prompt.login_url);
    println!();
    for line in prompt.instructions {
        println!("  {}", line);
    }
    println!();

    let token = read_line(&format!("Paste your {}: ", prompt.token_label))?;
    if token.is_empty() {
        println!("No token provided.");
        return Ok(());
    }

    if prompt.needs_rider_id {
        let rider_id = read_line("Paste your whoosh_uuid: ")?;
        if rider_id.is_empty() {
            println!("No whoosh_uuid provided.");
            return Ok(());
        }
        config.mywhoosh.rider_id = Some(rider_id);
        config.save()?;
    }

    match store.capture(spec.id, &token) {
        Ok(_) => {}
        Err(e) => {
            // Token usable for this session even though the save failed.
            eprintln!("Warning: token captured but not persisted: {}", e);
        }
    }

    let (_, message) = store.status_of(spec.id);
    println!();
    println!("Token saved for {} ({}).", spec.name, message);
    Ok(())
}

/// Clear stored credentials for one platform, or all of them.
pub fn logout<P: TokenPersistence>(
    store: &mut TokenStore<P>,
    platform_id: Option<&str>,
) -> Result<()> {
    match platform_id {
        Some(id) => {
            if store.clear(Some(id))? {
                println!("Cleared {} token.", id);
            } else {
                println!("No stored token for {}.", id);
            }
        }
        None => {
            store.clear(None)?;
            println!("Cleared all tokens.");
        }
    }
    Ok(())
}

/// Display per-platform token status.
pub fn status<P: TokenPersistence>(store: &TokenStore<P>) {
    for spec in PLATFORMS {
        print_status_line(store, spec.id, spec.name);
    }

    // Entries captured for platforms outside the built-in table still show up.
    let mut extras: Vec<&str> = store
        .list()
        .keys()
        .map(String::as_str)
        .filter(|id| platform(id).is_none())
        .collect();
    extras.sort_unstable();
    for id in extras {
        print_status_line(store, id, id);
    }

    if store.list().is_empty() {
        println!();
        println!("Run 'fitbridge login <platform>' to authenticate.");
    }
}

fn print_status_line<P: TokenPersistence>(store: &TokenStore<P>, id: &str, name: &str) {
    let (status, message) = store.status_of(id);
    match store.get(id) {
        Some(credential) => println!(
            "{:<14} {:<14} {} (captured {})",
            name,
            status.to_string(),
            message,
            credential.captured_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => println!("{:<14} {:<14} {}", name, status.to_string(), message),
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}
