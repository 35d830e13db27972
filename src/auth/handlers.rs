use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, MessageResponse, PublicUser, SignupRequest, UserResponse},
        password::{hash_password, verify_password},
        repo::{Role, Session, User},
        session::{removal_cookie, session_cookie, SESSION_COOKIE},
    },
    error::ApiError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>), ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("Email is required"))?;
    let username = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Username is required"))?;
    let password = payload
        .password
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Password is required"))?;

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    // Only user and business_owner may be self-assigned.
    let role = match payload.role.as_deref() {
        None | Some("user") => Role::User,
        Some("business_owner") => Role::BusinessOwner,
        Some(other) => {
            warn!(role = other, "invalid role on signup");
            return Err(ApiError::bad_request("Invalid role"));
        }
    };

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::bad_request("Email already registered"));
    }
    if User::find_by_username(&state.db, username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(ApiError::bad_request("Username already taken"));
    }

    let hash = hash_password(password)?;
    let user = User::create(&state.db, &email, username, &hash, role).await?;
    let session = Session::create(&state.db, user.id, state.config.session.ttl_days).await?;

    info!(user_id = %user.id, %email, "user signed up");
    let jar = jar.add(session_cookie(session.id, state.config.session.ttl_days));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(UserResponse { user: user.into() }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("Email is required"))?;
    let password = payload
        .password
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Password is required"))?;

    // Unknown email and wrong password are indistinguishable to the caller.
    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!(%email, "login unknown email");
            return Err(ApiError::Unauthorized);
        }
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    let session = Session::create(&state.db, user.id, state.config.session.ttl_days).await?;

    info!(user_id = %user.id, %email, "user logged in");
    let jar = jar.add(session_cookie(session.id, state.config.session.ttl_days));
    Ok((jar, Json(UserResponse { user: user.into() })))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    crate::auth::extractors::AuthUser(identity): crate::auth::extractors::AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    // Delete only the session this request presented; the user's other
    // sessions stay valid.
    if let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        Session::delete(&state.db, session_id).await?;
    }

    info!(user_id = %identity.id, "user logged out");
    let jar = jar.remove(removal_cookie());
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn me(
    crate::auth::extractors::AuthUser(identity): crate::auth::extractors::AuthUser,
) -> Json<UserResponse> {
    Json(UserResponse {
        user: PublicUser::from(identity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
