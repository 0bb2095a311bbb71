//! Session token issuance, validation and renewal.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;

use crate::config::JwtConfig;
use crate::models::AuthInfo;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Default validity window of a session token, in seconds.
pub const TOKEN_EXPIRE_INTERVAL: i64 = 60 * 60;

const ADMIN_COOKIE_PATH: &str = "/admin";
const USER_COOKIE_PATH: &str = "/";

/// Signs and verifies session tokens (HS512 over the [`AuthInfo`] claims).
///
/// Stateless: nothing is remembered between calls, so a token stays valid
/// with the permissions it was issued with until it expires.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: i64,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }
        if config.expiry_seconds <= 0 {
            return Err(anyhow::anyhow!("Token expiry must be positive"));
        }

        tracing::info!(
            expiry_seconds = config.expiry_seconds,
            "Token service initialized with HS512 key"
        );

        Ok(Self::from_secret(secret.as_bytes(), config.expiry_seconds))
    }

    pub fn from_secret(secret: &[u8], expiry_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_seconds,
        }
    }

    pub fn expiry_seconds(&self) -> i64 {
        self.expiry_seconds
    }

    /// Signs `info` with a window starting at `now`.
    pub fn issue(&self, info: &AuthInfo, now: DateTime<Utc>) -> Result<String, anyhow::Error> {
        self.sign(info, now).map(|(token, _)| token)
    }

    fn sign(
        &self,
        info: &AuthInfo,
        now: DateTime<Utc>,
    ) -> Result<(String, AuthInfo), anyhow::Error> {
        let claims = info.stamped(now, now + Duration::seconds(self.expiry_seconds));

        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))?;
        Ok((token, claims))
    }

    /// Verifies signature and expiry at `now`. Any failure reads as "no session".
    pub fn parse(&self, token: &str, now: DateTime<Utc>) -> Option<AuthInfo> {
        let mut validation = Validation::new(Algorithm::HS512);
        // Expiry is checked against the injected clock below
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        let claims = match decode::<AuthInfo>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                return None;
            }
        };

        if claims.is_expired(now) {
            tracing::debug!(user_id = %claims.user_id, "Session token expired");
            return None;
        }

        Some(claims)
    }

    /// Re-signs a still-valid session with a full window from `now`.
    pub fn renew(&self, info: &AuthInfo, now: DateTime<Utc>) -> Result<String, anyhow::Error> {
        self.issue(info, now)
    }

    /// Cookie for a freshly issued session; `Max-Age` is the time left on it.
    pub fn issue_cookie(
        &self,
        info: &AuthInfo,
        now: DateTime<Utc>,
    ) -> Result<Cookie<'static>, anyhow::Error> {
        let (token, claims) = self.sign(info, now)?;
        Ok(session_cookie(
            token,
            claims.remaining_seconds(now),
            info.is_admin,
        ))
    }

    /// Cookie for a renewed session; `Max-Age` is the full window.
    pub fn renew_cookie(
        &self,
        info: &AuthInfo,
        now: DateTime<Utc>,
    ) -> Result<Cookie<'static>, anyhow::Error> {
        let token = self.renew(info, now)?;
        Ok(session_cookie(token, self.expiry_seconds, info.is_admin))
    }

    /// Cookie instructing the client to drop its session token.
    pub fn clear_cookie(is_admin: bool) -> Cookie<'static> {
        session_cookie(String::new(), 0, is_admin)
    }

    /// Admin sessions are scoped to `/admin`, user sessions to `/`.
    pub fn cookie_path(is_admin: bool) -> &'static str {
        if is_admin {
            ADMIN_COOKIE_PATH
        } else {
            USER_COOKIE_PATH
        }
    }
}

fn session_cookie(token: String, max_age_seconds: i64, is_admin: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path(TokenService::cookie_path(is_admin))
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}
