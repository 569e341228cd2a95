//! Local handoff server for the browser extension
//!
//! The extension pushes its captured tokens to `POST /api/tokens` on
//! loopback. The handoff is fire-and-forget: a failed push is the user's to
//! retry from the extension popup, and a failed save here is logged but
//! never fails the request. Tokens only flow in; nothing serves the stored
//! credentials back out over HTTP.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use crate::auth::capture::MIN_TOKEN_LEN;
use crate::auth::{TokenPersistence, TokenStore};
use crate::config::TokenFile;
use crate::models::IncomingToken;

type SharedStore = Arc<Mutex<TokenStore<TokenFile>>>;

/// Apply a pushed payload to the store. Returns how many entries were
/// accepted (including ones whose save failed; in-memory state is
/// authoritative).
fn ingest<P: TokenPersistence>(
    store: &mut TokenStore<P>,
    incoming: HashMap<String, IncomingToken>,
) -> usize {
    let mut captured = 0;
    for (platform, entry) in incoming {
        let Some(token) = entry.token else {
            warn!(%platform, "pushed entry without token, skipping");
            continue;
        };
        if token.len() <= MIN_TOKEN_LEN {
            warn!(%platform, "pushed token too short, skipping");
            continue;
        }
        match store.capture(&platform, &token) {
            Ok(true) => {
                info!(
                    %platform,
                    name = entry.platform.as_deref().unwrap_or(&platform),
                    captured_at = entry.captured_at.as_deref().unwrap_or("unknown"),
                    "received token"
                );
                captured += 1;
            }
            Ok(false) => {
                debug!(%platform, "pushed token unchanged");
            }
            Err(e) => {
                warn!(%platform, "token accepted but not persisted: {}", e);
                captured += 1;
            }
        }
    }
    captured
}

async fn receive_tokens(
    State(store): State<SharedStore>,
    Json(incoming): Json<HashMap<String, IncomingToken>>,
) -> Json<serde_json::Value> {
    let mut store = store.lock().await;
    let captured = ingest(&mut store, incoming);
    Json(serde_json::json!({ "status": "ok", "captured": captured }))
}

async fn health() -> &'static str {
    "FitBridge is running"
}

/// Build the bridge router. The token route is push-only: stored
/// credentials must never be readable by an arbitrary page via a
/// cross-origin GET, so there is no read route and CORS only admits the
/// POST handshake.
pub fn router(store: SharedStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/tokens", post(receive_tokens))
        .route("/health", get(health))
        .layer(cors)
        .with_state(store)
}

/// Serve the handoff endpoint on loopback until interrupted.
pub async fn serve(store: SharedStore, port: u16) -> Result<()> {
    let app = router(store);
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, "Token bridge listening");
    println!("Token bridge listening on http://{}", addr);
    println!("Waiting for tokens from the browser extension (Ctrl-C to stop).");

    axum::serve(listener, app).await.context("Bridge server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt; // for oneshot

    use super::*;
    use crate::auth::{PersistenceError, TokenSnapshot};

    #[derive(Default)]
    struct NullPersistence;

    impl TokenPersistence for Rc<NullPersistence> {
        fn load(&self) -> Result<TokenSnapshot, PersistenceError> {
            Ok(TokenSnapshot::default())
        }

        fn save(&self, _tokens: &TokenSnapshot) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    fn payload(json: &str) -> HashMap<String, IncomingToken> {
        serde_json::from_str(json).unwrap()
    }

    fn test_router() -> (Router, SharedStore) {
        let dir = std::env::temp_dir().join(format!("fitbridge-bridge-{}", std::process::id()));
        let store = Arc::new(Mutex::new(TokenStore::load(TokenFile::new(
            dir.join("tokens.json"),
        ))));
        (router(store.clone()), store)
    }

    #[test]
    fn test_ingest_captures_pushed_tokens() {
        let mut store = TokenStore::load(Rc::new(NullPersistence));
        let incoming = payload(
            r#"{
                "mywhoosh": {
                    "token": "mywhoosh-token-that-is-long-enough",
                    "capturedAt": "2026-08-30T10:00:00Z",
                    "platform": "MyWhoosh"
                },
                "zwift": {
                    "token": "zwift-token-that-is-also-long-enough"
                }
            }"#,
        );

        assert_eq!(ingest(&mut store, incoming), 2);
        assert!(store.get("mywhoosh").is_some());
        assert!(store.get("zwift").is_some());
    }

    #[test]
    fn test_ingest_skips_malformed_entries() {
        let mut store = TokenStore::load(Rc::new(NullPersistence));
        let incoming = payload(
            r#"{
                "mywhoosh": { "platform": "MyWhoosh" },
                "zwift": { "token": "short" },
                "igpsport": { "token": "igpsport-token-that-is-long-enough" }
            }"#,
        );

        assert_eq!(ingest(&mut store, incoming), 1);
        assert_eq!(store.list().len(), 1);
        assert!(store.get("igpsport").is_some());
    }

    #[test]
    fn test_ingest_is_idempotent() {
        let mut store = TokenStore::load(Rc::new(NullPersistence));
        let body = r#"{"mywhoosh": {"token": "mywhoosh-token-that-is-long-enough"}}"#;

        assert_eq!(ingest(&mut store, payload(body)), 1);
        assert_eq!(ingest(&mut store, payload(body)), 0);
    }

    #[tokio::test]
    async fn test_post_tokens_is_accepted() {
        let (app, store) = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/tokens")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"zwift": {"token": "zwift-token-that-is-long-enough"}}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.lock().await.get("zwift").is_some());
    }

    #[tokio::test]
    async fn test_tokens_are_not_readable_over_http() {
        let (app, _store) = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/tokens")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_health_probe() {
        let (app, _store) = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
