use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    bookmarks::{
        dto::{BookmarkListResponse, BookmarkStatusResponse, CreateBookmarkRequest},
        repo::Bookmark,
    },
    businesses::repo::Business,
    error::ApiError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_bookmark))
        .route("/my/bookmarks", get(my_bookmarks))
        .route("/check/:business_id", get(check_bookmark))
        .route("/:business_id", delete(remove_bookmark))
}

#[instrument(skip(state, identity))]
pub async fn my_bookmarks(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<BookmarkListResponse>, ApiError> {
    let bookmarks = Bookmark::list_for_user(&state.db, identity.id).await?;
    Ok(Json(BookmarkListResponse { bookmarks }))
}

#[instrument(skip(state, identity))]
pub async fn check_bookmark(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(business_id): Path<Uuid>,
) -> Result<Json<BookmarkStatusResponse>, ApiError> {
    let bookmarked = Bookmark::exists(&state.db, identity.id, business_id).await?;
    Ok(Json(BookmarkStatusResponse { bookmarked }))
}

#[instrument(skip(state, identity, payload))]
pub async fn add_bookmark(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let business_id = payload
        .business_id
        .ok_or_else(|| ApiError::bad_request("Business ID is required"))?;

    if Business::find(&state.db, business_id).await?.is_none() {
        return Err(ApiError::not_found("Business not found"));
    }
    if Bookmark::exists(&state.db, identity.id, business_id).await? {
        return Err(ApiError::bad_request("Business already bookmarked"));
    }

    Bookmark::create(&state.db, identity.id, business_id).await?;
    info!(user_id = %identity.id, %business_id, "bookmark added");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Bookmark added successfully",
            "bookmarked": true
        })),
    ))
}

#[instrument(skip(state, identity))]
pub async fn remove_bookmark(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(business_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !Bookmark::exists(&state.db, identity.id, business_id).await? {
        return Err(ApiError::not_found("Bookmark not found"));
    }

    Bookmark::delete(&state.db, identity.id, business_id).await?;
    info!(user_id = %identity.id, %business_id, "bookmark removed");
    Ok(Json(serde_json::json!({
        "message": "Bookmark removed successfully",
        "bookmarked": false
    })))
}
