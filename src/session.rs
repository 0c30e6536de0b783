use crate::config::SessionConfig;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Credential bundle carried in the session cookie. The cookie holds the
/// literal API token; there is no server-side session table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub api_token: String,
    pub subdomain: String,
    #[serde(default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(email: String, api_token: String, subdomain: String) -> Self {
        Self {
            email,
            api_token,
            subdomain,
            issued_at: Utc::now(),
        }
    }
}

pub fn encode_session(session: &Session) -> String {
    STANDARD.encode(serde_json::to_vec(session).unwrap_or_default())
}

/// Decode a carrier value. Malformed base64 or JSON, a missing or blank
/// credential field, and an expired `issued_at` all resolve to `None`.
pub fn decode_session(raw: &str, ttl_hours: i64) -> Option<Session> {
    let bytes = STANDARD.decode(raw.trim()).ok()?;
    let session: Session = serde_json::from_slice(&bytes).ok()?;
    if session.email.trim().is_empty()
        || session.api_token.trim().is_empty()
        || session.subdomain.trim().is_empty()
    {
        return None;
    }
    if ttl_hours > 0 && Utc::now() > session.issued_at + Duration::hours(ttl_hours) {
        return None;
    }
    Some(session)
}

pub fn resolve(jar: &CookieJar, cfg: &SessionConfig) -> Option<Session> {
    let raw = jar.get(&cfg.cookie_name)?.value().to_string();
    decode_session(&raw, cfg.ttl_hours)
}

pub fn session_cookie(cfg: &SessionConfig, session: &Session) -> Cookie<'static> {
    let mut builder = Cookie::build((cfg.cookie_name.clone(), encode_session(session)))
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Lax)
        .path("/");
    if cfg.ttl_hours > 0 {
        builder = builder.max_age(time::Duration::hours(cfg.ttl_hours));
    }
    builder.build()
}

pub fn clear_session_cookie(cfg: &SessionConfig) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), ""))
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
