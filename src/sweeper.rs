use std::time::Duration;

use tracing::{debug, warn};

use crate::auth::repo::Session;
use crate::state::AppState;

/// Spawns the background GC tasks. Auth correctness never depends on either
/// sweep running: session resolution and captcha validation filter on
/// expiry themselves. The sweeps only bound storage growth.
pub fn spawn(state: AppState) {
    tokio::spawn(session_sweeper(state.clone()));
    tokio::spawn(captcha_sweeper(state.clone()));
    tokio::spawn(counter_sweeper(state));
}

async fn session_sweeper(state: AppState) {
    let mut interval =
        tokio::time::interval(Duration::from_secs(state.config.session.sweep_interval_secs));
    loop {
        interval.tick().await;
        match Session::delete_expired(&state.db).await {
            Ok(0) => {}
            Ok(n) => debug!(removed = n, "expired sessions swept"),
            Err(e) => warn!(error = %e, "session sweep failed"),
        }
    }
}

async fn captcha_sweeper(state: AppState) {
    let mut interval =
        tokio::time::interval(Duration::from_secs(state.config.captcha.sweep_interval_secs));
    loop {
        interval.tick().await;
        let removed = state.captcha.sweep().await;
        if removed > 0 {
            debug!(removed, "expired captcha challenges swept");
        }
    }
}

async fn counter_sweeper(state: AppState) {
    let mut interval =
        tokio::time::interval(Duration::from_secs(state.config.rate_limit.window_secs));
    loop {
        interval.tick().await;
        let removed = state.rate_counters.sweep().await;
        if removed > 0 {
            debug!(removed, "lapsed rate-limit counters swept");
        }
    }
}
