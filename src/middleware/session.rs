use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use chrono::Utc;
use std::sync::Arc;

use crate::config;
use crate::database::SessionStore;
use crate::error::ApiError;
use crate::policy::{PolicyResolver, Viewer};
use crate::state::AppState;

/// Value of the named cookie from the `Cookie` request header(s)
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

const LOCALE_MAX_AGE_DAYS: i64 = 365;

fn set_cookie(name: &str, value: &str, max_age_days: i64) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name,
        value,
        max_age_days * 24 * 60 * 60
    );
    if config::config().security.secure_cookies {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// `Set-Cookie` value selecting the active child profile
pub fn active_child_cookie(child_id: &str) -> Result<HeaderValue, ApiError> {
    let security = &config::config().security;
    set_cookie(&security.active_child_cookie, child_id, security.active_child_max_age_days)
        .ok_or_else(|| ApiError::bad_request("Invalid child id"))
}

/// `Set-Cookie` value remembering the interface locale for a year
pub fn locale_cookie(locale: &str) -> Result<HeaderValue, ApiError> {
    set_cookie(&config::config().security.locale_cookie, locale, LOCALE_MAX_AGE_DAYS)
        .ok_or_else(|| ApiError::bad_request("Invalid locale"))
}

/// User id behind the session cookie. Unknown and expired sessions are anonymous;
/// expired rows are removed on sight.
pub async fn session_user<S: SessionStore + ?Sized>(
    store: &S,
    token: Option<&str>,
) -> Result<Option<String>, ApiError> {
    let token = match token {
        Some(token) => token,
        None => return Ok(None),
    };

    let session = match store.find_session(token).await? {
        Some(session) => session,
        None => return Ok(None),
    };

    if session.is_expired(Utc::now()) {
        tracing::warn!("Session {} expired, removing", session.id);
        store.delete_session(&session.id).await?;
        return Ok(None);
    }

    Ok(Some(session.user_id))
}

/// Resolves the viewer once per request from the session and active-child cookies
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let security = &config::config().security;
        let token = cookie_value(&parts.headers, &security.session_cookie);
        let selection = cookie_value(&parts.headers, &security.active_child_cookie);

        let store = state.store.as_ref();
        let user_id = session_user(store, token.as_deref()).await?;
        let viewer = PolicyResolver::new(store).viewer(user_id, selection.as_deref()).await?;
        Ok(viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use chrono::Duration;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn reads_named_cookie() {
        let h = headers("theme=dark; session_token=abc123; active_child_id=\"kid-1\"");
        assert_eq!(cookie_value(&h, "session_token").as_deref(), Some("abc123"));
        assert_eq!(cookie_value(&h, "active_child_id").as_deref(), Some("kid-1"));
        assert_eq!(cookie_value(&h, "missing"), None);
        assert_eq!(cookie_value(&headers("session_token="), "session_token"), None);
    }

    #[test]
    fn active_child_cookie_attributes() {
        let value = active_child_cookie("kid-1").unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("active_child_id=kid-1; Path=/; Max-Age=2592000"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
    }

    #[test]
    fn locale_cookie_lasts_a_year() {
        let value = locale_cookie("ky").unwrap();
        assert!(value.to_str().unwrap().starts_with("locale=ky; Path=/; Max-Age=31536000; HttpOnly"));
    }

    #[tokio::test]
    async fn expired_sessions_are_anonymous_and_removed() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        store.add_session("fresh", "parent", Utc::now() + Duration::hours(1)).await;
        store.add_session("stale", "parent", Utc::now() - Duration::hours(1)).await;

        assert_eq!(session_user(&store, Some("fresh")).await.unwrap().as_deref(), Some("parent"));
        assert_eq!(session_user(&store, Some("stale")).await.unwrap(), None);
        assert_eq!(session_user(&store, Some("unknown")).await.unwrap(), None);
        assert_eq!(session_user(&store, None).await.unwrap(), None);
        assert_eq!(store.session_count().await, 1);
    }
}
