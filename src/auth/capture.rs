//! Token capture adapters
//!
//! Two capture paths feed the store: an observed HTTP exchange whose URL
//! matches a known platform's API host, and an interactive paste flow for
//! platforms that block programmatic login. Both end in
//! [`TokenStore::capture`]; neither blocks the core on human input.

use tracing::debug;

use super::store::{StoreError, TokenPersistence, TokenStore};
use super::{match_url, PlatformSpec};

/// Bearer values at or below this length are noise (CSRF tokens, session
/// ids), not credentials worth capturing.
pub const MIN_TOKEN_LEN: usize = 20;

/// Strip a `Bearer ` prefix from an Authorization header value.
pub fn strip_bearer(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
}

/// Observe one HTTP exchange. If the URL belongs to a known platform and the
/// Authorization value carries a non-trivial bearer token, capture it.
/// Returns whether a store write occurred.
pub fn observe_request<P: TokenPersistence>(
    store: &mut TokenStore<P>,
    url: &str,
    authorization: &str,
) -> Result<bool, StoreError> {
    let Some(platform) = match_url(url) else {
        return Ok(false);
    };
    let Some(token) = strip_bearer(authorization) else {
        debug!(platform = platform.id, "authorization value is not a bearer token");
        return Ok(false);
    };
    if token.len() <= MIN_TOKEN_LEN {
        debug!(platform = platform.id, "bearer value too short, ignoring");
        return Ok(false);
    }
    store.capture(platform.id, token)
}

/// Everything a CLI or UI needs to resolve an interactive capture: where to
/// log in and what to copy. The surrounding collaborator gathers the input
/// and calls [`TokenStore::capture`] itself; this is the suspend point, not
/// a blocking prompt.
#[derive(Debug)]
pub struct CapturePrompt {
    pub login_url: &'static str,
    pub token_label: &'static str,
    pub instructions: &'static [&'static str],
    /// MyWhoosh also needs the rider's `whoosh_uuid`, which is configuration
    /// rather than a credential.
    pub needs_rider_id: bool,
}

/// Describe the paste flow for a platform.
pub fn paste_prompt(platform: &PlatformSpec) -> CapturePrompt {
    CapturePrompt {
        login_url: platform.login_url,
        token_label: platform.token_label,
        instructions: platform.paste_instructions,
        needs_rider_id: platform.needs_rider_id,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::super::store::{PersistenceError, TokenSnapshot};
    use super::*;

    #[derive(Default)]
    struct NullPersistence {
        saves: RefCell<usize>,
    }

    impl TokenPersistence for Rc<NullPersistence> {
        fn load(&self) -> Result<TokenSnapshot, PersistenceError> {
            Ok(TokenSnapshot::default())
        }

        fn save(&self, _tokens: &TokenSnapshot) -> Result<(), PersistenceError> {
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    fn empty_store() -> TokenStore<Rc<NullPersistence>> {
        TokenStore::load(Rc::new(NullPersistence::default()))
    }

    const LONG_TOKEN: &str = "Bearer abcdefghijklmnopqrstuvwxyz0123456789";

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc"), Some("abc"));
        assert_eq!(strip_bearer("bearer abc"), Some("abc"));
        assert_eq!(strip_bearer("Basic abc"), None);
        assert_eq!(strip_bearer("abc"), None);
    }

    #[test]
    fn test_matches_mywhoosh_hosts() {
        assert_eq!(
            match_url("https://service.mywhoosh.com/api/foo").unwrap().id,
            "mywhoosh"
        );
        assert_eq!(
            match_url("https://services.mywhoosh.com/api/foo").unwrap().id,
            "mywhoosh"
        );
        assert_eq!(
            match_url("https://service26.mywhoosh.com/v2/rider").unwrap().id,
            "mywhoosh"
        );
        assert!(match_url("https://service14.mywhoosh.com/v2/rider").is_none());
    }

    #[test]
    fn test_zwift_requires_api_path() {
        assert_eq!(
            match_url("https://us-or-rly101.zwift.com/api/profiles/me").unwrap().id,
            "zwift"
        );
        assert!(match_url("https://www.zwift.com/shop").is_none());
    }

    #[test]
    fn test_matches_igpsport_and_trainingpeaks() {
        assert_eq!(
            match_url("https://prod.en.igpsport.com/service/web/activity").unwrap().id,
            "igpsport"
        );
        assert_eq!(
            match_url("https://api.trainingpeaks.com/v1/athlete").unwrap().id,
            "trainingpeaks"
        );
        assert_eq!(
            match_url("https://www.trainingpeaks.com/tpwebapp").unwrap().id,
            "trainingpeaks"
        );
    }

    #[test]
    fn test_unknown_host_is_ignored() {
        let mut store = empty_store();
        assert!(!observe_request(&mut store, "https://example.com/api", LONG_TOKEN).unwrap());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_observe_captures_bearer_token() {
        let mut store = empty_store();
        let wrote = observe_request(
            &mut store,
            "https://service26.mywhoosh.com/v2/rider/profile",
            LONG_TOKEN,
        )
        .unwrap();
        assert!(wrote);
        assert_eq!(
            store.get("mywhoosh").unwrap().token,
            "abcdefghijklmnopqrstuvwxyz0123456789"
        );
    }

    #[test]
    fn test_short_token_is_ignored() {
        let mut store = empty_store();
        let wrote = observe_request(
            &mut store,
            "https://prod.en.igpsport.com/service",
            "Bearer short-token",
        )
        .unwrap();
        assert!(!wrote);
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_non_bearer_auth_is_ignored() {
        let mut store = empty_store();
        let wrote = observe_request(
            &mut store,
            "https://api.trainingpeaks.com/v1/athlete",
            "Basic dXNlcjpwYXNzd29yZC1sb25nLWVub3VnaA==",
        )
        .unwrap();
        assert!(!wrote);
    }
}
