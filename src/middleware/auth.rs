use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::principal::{resolve_principal, Principal};
use crate::auth::SESSION_COOKIE;
use crate::error::ApiError;

/// Extracts the authenticated principal from the session cookie.
///
/// Every failure cause (missing cookie, bad or expired token, deleted user)
/// rejects uniformly with 401 so the response does not leak which one it was.
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

        let principal = resolve_principal(token.as_deref()).await?;
        principal.ok_or_else(|| ApiError::unauthenticated("Unauthorized"))
    }
}
