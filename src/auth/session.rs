use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use uuid::Uuid;

/// Cookie carrying the opaque session id. The value is a lookup key only,
/// never trusted data.
pub const SESSION_COOKIE: &str = "session_id";

pub fn session_cookie(session_id: Uuid, ttl_days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(Duration::days(ttl_days))
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_has_required_attributes() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id, 7);
        assert_eq!(cookie.name(), "session_id");
        assert_eq!(cookie.value(), id.to_string());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn removal_cookie_targets_same_name_and_path() {
        let cookie = removal_cookie();
        assert_eq!(cookie.name(), "session_id");
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.value().is_empty());
    }
}
