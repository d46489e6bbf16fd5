pub mod guards;
pub mod policy;
pub mod principal;

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// Name of the session cookie carrying the signed token
pub const SESSION_COOKIE: &str = "access_token";

/// Session token payload. Carries only the user id plus the standard
/// issued-at/expiry timestamps.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        let expiry_days = config::config().security.token_expiry_days;
        let exp = (now + Duration::days(expiry_days)).timestamp();

        Self {
            user_id,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token generation error: {0}")]
    Generation(String),

    #[error("Invalid session token")]
    Invalid,

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Sign a session token for the given user
pub fn generate_token(user_id: Uuid) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    encode_with_secret(&Claims::new(user_id), secret)
}

/// Verify a session token, returning the user id it was issued for.
/// Fails on expiry, signature mismatch, or malformed payload.
pub fn verify_token(token: &str) -> Result<Uuid, TokenError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    decode_with_secret(token, secret).map(|claims| claims.user_id)
}

fn encode_with_secret(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

fn decode_with_secret(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| TokenError::Invalid)
}

/// Hash a password for storage. One-way, salted, cost factor from config.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, config::config().security.bcrypt_cost)
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Build the session cookie carrying a freshly issued token
pub fn session_cookie(token: String) -> Cookie<'static> {
    let security = &config::config().security;

    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::days(security.token_expiry_days));
    cookie.set_secure(security.secure_cookies);
    cookie
}

/// Expired variant of the session cookie, used to clear the session on logout
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";

    #[test]
    fn token_round_trips_to_same_user() {
        let user_id = Uuid::new_v4();
        let token = encode_with_secret(&Claims::new(user_id), SECRET).unwrap();
        let claims = decode_with_secret(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, user_id);
    }

    #[test]
    fn token_fails_with_wrong_secret() {
        let token = encode_with_secret(&Claims::new(Uuid::new_v4()), SECRET).unwrap();
        assert!(matches!(
            decode_with_secret(&token, "other-secret"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            user_id: Uuid::new_v4(),
            exp: (now - Duration::days(1)).timestamp(),
            iat: (now - Duration::days(8)).timestamp(),
        };
        let token = encode_with_secret(&claims, SECRET).unwrap();
        assert!(matches!(
            decode_with_secret(&token, SECRET),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(matches!(
            decode_with_secret("not-a-token", SECRET),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn session_cookie_flags() {
        let cookie = session_cookie("tok".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.max_age().unwrap() >= time::Duration::days(1));
    }

    #[test]
    fn expired_cookie_clears_session() {
        let cookie = expired_session_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
