use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Request, middleware, middleware::Next, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ratelimit::RateLimiter;
use crate::state::AppState;
use crate::{auth, bookmarks, businesses, deals, reviews};

pub fn build_app(state: AppState) -> Router {
    let window = Duration::from_secs(state.config.rate_limit.window_secs);
    let general = RateLimiter::new(
        Arc::clone(&state.rate_counters),
        "general",
        state.config.rate_limit.max_requests,
        window,
        "Too many requests from this address, please try again later",
    );
    let auth_limiter = RateLimiter::new(
        Arc::clone(&state.rate_counters),
        "auth",
        state.config.rate_limit.auth_max_requests,
        window,
        "Too many authentication attempts, please try again later",
    );

    Router::new()
        .nest(
            "/api",
            Router::new()
                .nest(
                    "/auth",
                    auth::router().layer(middleware::from_fn(move |req: Request, next: Next| {
                        auth_limiter.clone().handle(req, next)
                    })),
                )
                .nest("/businesses", businesses::router())
                .nest("/reviews", reviews::router())
                .nest("/bookmarks", bookmarks::router())
                .nest("/deals", deals::router())
                .route("/health", get(|| async { "ok" }))
                .layer(middleware::from_fn(move |req: Request, next: Next| {
                    general.clone().handle(req, next)
                })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt;

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_answers_without_auth() {
        let app = build_app(AppState::fake());
        let res = app.oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_without_cookie_is_401() {
        let app = build_app(AppState::fake());
        let res = app.oneshot(get_request("/api/auth/me")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn user_reviews_route_is_public() {
        let app = build_app(AppState::fake());
        let uri = format!("/api/reviews/user/{}", uuid::Uuid::new_v4());
        let res = app.oneshot(get_request(&uri)).await.unwrap();
        // No live database behind the fake state, but routing and auth
        // must resolve before the repository is reached.
        assert_ne!(res.status(), StatusCode::NOT_FOUND);
        assert_ne!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_endpoints_carry_a_tighter_rate_limit() {
        let app = build_app(AppState::fake());
        for _ in 0..5 {
            let res = app
                .clone()
                .oneshot(get_request("/api/auth/me"))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
        let res = app.oneshot(get_request("/api/auth/me")).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
