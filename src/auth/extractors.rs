use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::auth::repo::{Identity, Session};
use crate::auth::session::SESSION_COOKIE;
use crate::error::ApiError;
use crate::state::AppState;

/// Required authentication: rejects with 401 when the session cookie is
/// missing, malformed, unknown or expired. The client cannot tell those
/// apart. Storage failures surface as 500, never as unauthenticated.
pub struct AuthUser(pub Identity);

/// Optional authentication: anonymous instead of rejected when no valid
/// session is present.
pub struct MaybeUser(pub Option<Identity>);

/// A missing or malformed cookie value yields None without touching the
/// database; the cookie is only ever a lookup key.
fn cookie_session_id(parts: &Parts) -> Option<Uuid> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = cookie_session_id(parts).ok_or(ApiError::Unauthorized)?;

        match Session::resolve(&state.db, session_id).await {
            Ok(Some(identity)) => Ok(AuthUser(identity)),
            Ok(None) => {
                warn!(%session_id, "session expired or invalid");
                Err(ApiError::Unauthorized)
            }
            Err(e) => Err(ApiError::Internal(e)),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session_id) = cookie_session_id(parts) else {
            return Ok(MaybeUser(None));
        };

        match Session::resolve(&state.db, session_id).await {
            Ok(identity) => Ok(MaybeUser(identity)),
            Err(e) => Err(ApiError::Internal(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/me");
        if let Some(v) = value {
            builder = builder.header("cookie", format!("{}={}", SESSION_COOKIE, v));
        }
        let (parts, _) = builder.body(()).expect("request").into_parts();
        parts
    }

    #[test]
    fn missing_cookie_yields_no_session_id() {
        assert!(cookie_session_id(&parts_with_cookie(None)).is_none());
    }

    #[test]
    fn malformed_cookie_value_is_treated_as_absent() {
        assert!(cookie_session_id(&parts_with_cookie(Some("not-a-uuid"))).is_none());
    }

    #[test]
    fn valid_uuid_cookie_is_extracted() {
        let id = Uuid::new_v4();
        let parts = parts_with_cookie(Some(&id.to_string()));
        assert_eq!(cookie_session_id(&parts), Some(id));
    }

    // The cookie-less paths below never reach the pool, so the lazily
    // connecting test state is enough to drive the extractors end to end.

    #[tokio::test]
    async fn required_auth_without_cookie_is_rejected() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(None);
        match AuthUser::from_request_parts(&mut parts, &state).await {
            Err(ApiError::Unauthorized) => {}
            Err(other) => panic!("expected Unauthorized, got {other}"),
            Ok(_) => panic!("authenticated without a cookie"),
        }
    }

    #[tokio::test]
    async fn required_auth_with_malformed_cookie_is_rejected() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(Some("not-a-uuid"));
        match AuthUser::from_request_parts(&mut parts, &state).await {
            Err(ApiError::Unauthorized) => {}
            Err(other) => panic!("expected Unauthorized, got {other}"),
            Ok(_) => panic!("authenticated with a malformed cookie"),
        }
    }

    #[tokio::test]
    async fn optional_auth_without_cookie_is_anonymous() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(None);
        let MaybeUser(identity) = MaybeUser::from_request_parts(&mut parts, &state)
            .await
            .expect("anonymous requests pass through");
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn optional_auth_with_malformed_cookie_is_anonymous() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(Some("garbage"));
        let MaybeUser(identity) = MaybeUser::from_request_parts(&mut parts, &state)
            .await
            .expect("malformed cookies read as absent");
        assert!(identity.is_none());
    }
}
