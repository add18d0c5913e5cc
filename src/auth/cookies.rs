use axum_extra::extract::cookie::{Cookie, CookieJar, Expiration, SameSite};
use chrono::{DateTime, Utc};
use time::error::ComponentRange;
use time::{Duration, OffsetDateTime};

pub const AUTH_COOKIE_NAME: &str = "auth_token";
pub const STATE_COOKIE_NAME: &str = "oauth_state";

const STATE_COOKIE_PATH: &str = "/auth";
const STATE_COOKIE_TTL_MINUTES: i64 = 10;

/// Create the session cookie carrying a signed token.
///
/// `Expires` is the token's own expiry, to the second. Fails when that
/// instant cannot be written as a cookie date.
pub fn session_cookie(
    token: &str,
    expires_at: DateTime<Utc>,
    secure: bool,
) -> Result<Cookie<'static>, ComponentRange> {
    let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp())?;

    Ok(Cookie::build((AUTH_COOKIE_NAME, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .expires(Expiration::DateTime(expires))
        .build())
}

/// Create removal cookie for the session.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, "")).path("/").build()
}

/// Create the short-lived anti-forgery state cookie.
///
/// SameSite=Lax so the browser still sends it on the redirect back from Google.
pub fn state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, state.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(STATE_COOKIE_PATH)
        .max_age(Duration::minutes(STATE_COOKIE_TTL_MINUTES))
        .build()
}

/// Create removal cookie for the anti-forgery state.
pub fn clear_state_cookie() -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, ""))
        .path(STATE_COOKIE_PATH)
        .build()
}

/// Get the anti-forgery state from cookies.
pub fn get_state(jar: &CookieJar) -> Option<String> {
    jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string())
}

/// Get the session token from cookies.
pub fn get_session_token(jar: &CookieJar) -> Option<String> {
    jar.get(AUTH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
