//! Signed session tokens carried in the `auth_token` cookie.
//!
//! The token is the base64url encoding of [`SessionClaims`] signed with the
//! cookie crate's HMAC signed jar, so verification needs nothing but the key.

use axum::http::{HeaderMap, StatusCode, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tower_sessions::cookie::{Cookie, CookieJar, Key, SameSite};

use crate::constants::*;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionClaims {
    /// Remote user id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, PartialEq)]
pub enum SessionError {
    Missing,
    Invalid,
    Expired,
}

impl From<SessionError> for (StatusCode, String) {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Missing => (StatusCode::UNAUTHORIZED, ERR_TOKEN_REQUIRED.to_string()),
            SessionError::Invalid | SessionError::Expired => {
                (StatusCode::FORBIDDEN, ERR_INVALID_TOKEN.to_string())
            }
        }
    }
}

#[derive(Clone)]
pub struct SessionSigner {
    key: Key,
    secure: bool,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &str, secure: bool) -> Result<Self, String> {
        let key = Key::try_from(secret.as_bytes())
            .map_err(|e| format!("Invalid session secret: {}", e))?;
        Ok(Self {
            key,
            secure,
            ttl: Duration::days(SESSION_EXPIRY_DAYS),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn mint(&self, user_id: &str, email: &str) -> String {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl.whole_seconds(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(SESSION_COOKIE_NAME, payload));
        jar.get(SESSION_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .unwrap_or_default()
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(SESSION_COOKIE_NAME, token.to_string()));
        let verified = jar
            .signed(&self.key)
            .get(SESSION_COOKIE_NAME)
            .ok_or(SessionError::Invalid)?;

        let bytes = URL_SAFE_NO_PAD
            .decode(verified.value())
            .map_err(|_| SessionError::Invalid)?;
        let claims: SessionClaims =
            serde_json::from_slice(&bytes).map_err(|_| SessionError::Invalid)?;

        if claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }

    /// `Set-Cookie` value carrying a freshly minted token.
    pub fn session_cookie(&self, token: String) -> String {
        Cookie::build((SESSION_COOKIE_NAME, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(self.ttl)
            .build()
            .to_string()
    }

    /// `Set-Cookie` value that makes the browser drop the session.
    pub fn removal_cookie(&self) -> String {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
            .to_string()
    }

    /// Reads and verifies the session cookie from request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<SessionClaims, SessionError> {
        let token = session_token(headers).ok_or(SessionError::Missing)?;
        self.verify(&token)
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
